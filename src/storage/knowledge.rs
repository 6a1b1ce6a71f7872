//! Action handler storage: load, additive merge, and operator edits.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::knowledge::{
    ActionHandlerEntry, HandlerChange, KnowledgeBackend, REVIEW_THRESHOLD, WRONG_OUTPUT_PENALTY,
};

use super::{Result, Storage, StorageError};

impl KnowledgeBackend for Storage {
    fn load(&self) -> Result<Vec<ActionHandlerEntry>> {
        let conn = self.connect()?;
        load_rows(&conn)
    }

    fn merge(&self, changes: &[HandlerChange]) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for change in changes {
            if let Some(created) = &change.created {
                tx.execute(
                    "INSERT INTO action_handlers
                         (kind, template, confidence, usage_count, learned, needs_review, first_seen, last_used)
                     VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, NULL)
                     ON CONFLICT(kind) DO NOTHING",
                    rusqlite::params![
                        &created.kind,
                        &created.template,
                        created.confidence,
                        created.learned,
                        created.needs_review,
                        created.first_seen.to_string(),
                    ],
                )?;
            }
            tx.execute(
                "UPDATE action_handlers
                 SET usage_count = usage_count + ?2,
                     confidence = MAX(0, MIN(100, confidence + ?3)),
                     last_used = COALESCE(?4, last_used)
                 WHERE kind = ?1",
                rusqlite::params![
                    &change.kind,
                    change.uses,
                    change.confidence_delta,
                    change.used_at.map(|t| t.to_string()),
                ],
            )?;
            tx.execute(
                "UPDATE action_handlers SET needs_review = (confidence < ?2) WHERE kind = ?1",
                rusqlite::params![&change.kind, REVIEW_THRESHOLD],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl Storage {
    /// Loads a single entry.
    pub fn load_handler(&self, kind: &str) -> Result<ActionHandlerEntry> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT kind, template, confidence, usage_count, learned, needs_review, first_seen, last_used
             FROM action_handlers WHERE kind = ?1",
            [kind],
            read_row,
        )
        .optional()?
        .ok_or_else(|| StorageError::UnknownAction(kind.to_string()))?
        .try_into_entry()
    }

    /// Promotes a kind to an operator-approved handler with the given template.
    ///
    /// Creates the entry if it does not exist.
    pub fn promote_handler(&self, kind: &str, template: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO action_handlers
                 (kind, template, confidence, usage_count, learned, needs_review, first_seen, last_used)
             VALUES (?1, ?2, 100, 0, 0, 0, ?3, NULL)
             ON CONFLICT(kind) DO UPDATE SET
                 template = excluded.template,
                 confidence = 100,
                 learned = 0,
                 needs_review = 0",
            rusqlite::params![kind, template, Timestamp::now().to_string()],
        )?;
        Ok(())
    }

    /// Reports a kind's output as semantically wrong.
    pub fn flag_handler(&self, kind: &str) -> Result<()> {
        // Existence check first so the caller gets a clear error.
        self.load_handler(kind)?;
        self.merge(&[HandlerChange {
            kind: kind.to_string(),
            created: None,
            uses: 0,
            confidence_delta: -WRONG_OUTPUT_PENALTY,
            used_at: None,
        }])
    }

    /// Deletes a kind's entry.
    pub fn forget_handler(&self, kind: &str) -> Result<()> {
        let conn = self.connect()?;
        let rows = conn.execute("DELETE FROM action_handlers WHERE kind = ?1", [kind])?;
        if rows == 0 {
            return Err(StorageError::UnknownAction(kind.to_string()));
        }
        Ok(())
    }
}

/// Raw column values of one row.
struct HandlerRow {
    kind: String,
    template: String,
    confidence: i64,
    usage_count: i64,
    learned: bool,
    needs_review: bool,
    first_seen: String,
    last_used: Option<String>,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HandlerRow> {
    Ok(HandlerRow {
        kind: row.get(0)?,
        template: row.get(1)?,
        confidence: row.get(2)?,
        usage_count: row.get(3)?,
        learned: row.get(4)?,
        needs_review: row.get(5)?,
        first_seen: row.get(6)?,
        last_used: row.get(7)?,
    })
}

impl HandlerRow {
    fn try_into_entry(self) -> Result<ActionHandlerEntry> {
        let confidence = u8::try_from(self.confidence)
            .ok()
            .filter(|c| *c <= 100)
            .ok_or_else(|| {
                StorageError::Corrupt(format!(
                    "confidence {} out of range for {}",
                    self.confidence, self.kind
                ))
            })?;
        let usage_count = u64::try_from(self.usage_count).map_err(|_| {
            StorageError::Corrupt(format!("negative usage count for {}", self.kind))
        })?;
        let first_seen = self
            .first_seen
            .parse::<Timestamp>()
            .map_err(|e| StorageError::Corrupt(format!("invalid first_seen: {e}")))?;
        let last_used = self
            .last_used
            .map(|s| s.parse::<Timestamp>())
            .transpose()
            .map_err(|e| StorageError::Corrupt(format!("invalid last_used: {e}")))?;

        Ok(ActionHandlerEntry {
            kind: self.kind,
            template: self.template,
            confidence,
            usage_count,
            learned: self.learned,
            needs_review: self.needs_review,
            first_seen,
            last_used,
        })
    }
}

fn load_rows(conn: &Connection) -> Result<Vec<ActionHandlerEntry>> {
    let mut stmt = conn.prepare(
        "SELECT kind, template, confidence, usage_count, learned, needs_review, first_seen, last_used
         FROM action_handlers ORDER BY kind",
    )?;
    let rows = stmt.query_map([], read_row)?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?.try_into_entry()?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    use tempfile::TempDir;

    use crate::knowledge::{INITIAL_CONFIDENCE, KnowledgeStore, synthesize_template};

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("knowledge.sqlite")).unwrap();
        (dir, storage)
    }

    fn seed(storage: &Storage, kind: &str) {
        let mut store = KnowledgeStore::load(storage).unwrap();
        store.register(kind, synthesize_template(kind));
        store.save(storage).unwrap();
    }

    #[test]
    fn load_empty_store() {
        let (_dir, storage) = test_storage();
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn registered_entry_round_trips() {
        let (_dir, storage) = test_storage();
        seed(&storage, "HIGHLIGHT");

        let entry = storage.load_handler("HIGHLIGHT").unwrap();
        assert_eq!(entry.template, "highlight {subject}");
        assert_eq!(entry.confidence, INITIAL_CONFIDENCE);
        assert_eq!(entry.usage_count, 1);
        assert!(entry.learned);
        assert!(entry.needs_review);
        assert!(entry.last_used.is_some());
    }

    #[test]
    fn merge_leaves_unrelated_entries_alone() {
        let (_dir, storage) = test_storage();
        seed(&storage, "HIGHLIGHT");
        storage.promote_handler("SHAKE", "Shake {target}").unwrap();

        let mut store = KnowledgeStore::load(&storage).unwrap();
        store.use_strategy("HIGHLIGHT");
        store.save(&storage).unwrap();

        let shake = storage.load_handler("SHAKE").unwrap();
        assert_eq!(shake.template, "Shake {target}");
        assert_eq!(shake.usage_count, 0);
        assert_eq!(shake.confidence, 100);
        assert_eq!(storage.load_handler("HIGHLIGHT").unwrap().usage_count, 2);
    }

    #[test]
    fn concurrent_merges_add_up() {
        let (_dir, storage) = test_storage();
        seed(&storage, "HIGHLIGHT");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let storage = storage.clone();
                thread::spawn(move || {
                    let mut store = KnowledgeStore::load(&storage).unwrap();
                    store.use_strategy("HIGHLIGHT");
                    store.use_strategy("HIGHLIGHT");
                    store.save(&storage).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(storage.load_handler("HIGHLIGHT").unwrap().usage_count, 9);
    }

    #[test]
    fn concurrent_creation_keeps_one_entry() {
        let (_dir, storage) = test_storage();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let storage = storage.clone();
                thread::spawn(move || seed(&storage, "WIGGLE"))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let entries = storage.load().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].usage_count, 3);
    }

    #[test]
    fn promote_overrides_template_and_clears_review() {
        let (_dir, storage) = test_storage();
        seed(&storage, "HIGHLIGHT");
        storage
            .promote_handler("HIGHLIGHT", "Highlight {target}")
            .unwrap();

        let entry = storage.load_handler("HIGHLIGHT").unwrap();
        assert_eq!(entry.template, "Highlight {target}");
        assert_eq!(entry.confidence, 100);
        assert!(!entry.learned);
        assert!(!entry.needs_review);
        assert_eq!(entry.usage_count, 1);
    }

    #[test]
    fn flag_lowers_confidence() {
        let (_dir, storage) = test_storage();
        storage.promote_handler("HIGHLIGHT", "Highlight {target}").unwrap();
        storage.flag_handler("HIGHLIGHT").unwrap();
        storage.flag_handler("HIGHLIGHT").unwrap();

        let entry = storage.load_handler("HIGHLIGHT").unwrap();
        assert_eq!(entry.confidence, 60);
        assert!(entry.needs_review);
    }

    #[test]
    fn flag_unknown_kind_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.flag_handler("NOPE").unwrap_err();
        assert!(matches!(err, StorageError::UnknownAction(_)));
    }

    #[test]
    fn forget_removes_entry() {
        let (_dir, storage) = test_storage();
        seed(&storage, "HIGHLIGHT");
        storage.forget_handler("HIGHLIGHT").unwrap();

        assert!(storage.load().unwrap().is_empty());
        let err = storage.forget_handler("HIGHLIGHT").unwrap_err();
        assert!(matches!(err, StorageError::UnknownAction(_)));
    }
}
