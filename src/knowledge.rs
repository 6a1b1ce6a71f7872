//! Action knowledge: learned render strategies for unrecognized action kinds.
//!
//! The store is loaded once at the start of a run and merged back once at
//! the end. During a run only in-memory counters change; the backend sees
//! a list of [`HandlerChange`] deltas, never a snapshot, so concurrent runs
//! add to each other's counts instead of overwriting them.

use std::collections::BTreeMap;
use std::sync::Mutex;

use jiff::Timestamp;
use serde::Serialize;

use crate::storage::StorageError;

/// Confidence given to a freshly synthesized strategy.
pub const INITIAL_CONFIDENCE: u8 = 25;

/// Confidence gained by an existing strategy used cleanly in a run.
pub const CLEAN_USE_BONUS: i32 = 5;

/// Confidence lost when a run reports the strategy's output as wrong.
pub const WRONG_OUTPUT_PENALTY: i32 = 20;

/// Entries below this confidence need operator review.
pub const REVIEW_THRESHOLD: u8 = 70;

/// A persisted handler for one action kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ActionHandlerEntry {
    pub kind: String,

    /// Render template with `{subject}`, `{target}`, `{value}`, `{variable}` placeholders.
    pub template: String,

    /// 0–100.
    pub confidence: u8,
    pub usage_count: u64,

    /// Synthesized by a run rather than written by an operator.
    pub learned: bool,
    pub needs_review: bool,
    pub first_seen: Timestamp,
    pub last_used: Option<Timestamp>,
}

impl ActionHandlerEntry {
    /// A freshly synthesized, low-confidence entry.
    pub fn learned(kind: &str, template: String, now: Timestamp) -> Self {
        Self {
            kind: kind.to_string(),
            template,
            confidence: INITIAL_CONFIDENCE,
            usage_count: 0,
            learned: true,
            needs_review: true,
            first_seen: now,
            last_used: None,
        }
    }

    /// Apply a run's delta to this entry.
    pub fn apply(&mut self, change: &HandlerChange) {
        self.usage_count += change.uses;
        self.confidence = clamp_confidence(i32::from(self.confidence) + change.confidence_delta);
        self.needs_review = self.confidence < REVIEW_THRESHOLD;
        if change.used_at > self.last_used {
            self.last_used = change.used_at;
        }
    }
}

/// Clamp a confidence score into 0–100.
pub fn clamp_confidence(value: i32) -> u8 {
    u8::try_from(value.clamp(0, 100)).unwrap_or(100)
}

/// The generic strategy for a kind nobody has taught us:
/// the lowercased kind followed by whatever the step acts on.
pub fn synthesize_template(kind: &str) -> String {
    let verb = kind.to_lowercase().replace('_', " ");
    format!("{} {{subject}}", verb.trim())
}

/// One run's effect on one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerChange {
    pub kind: String,

    /// Set when this run created the entry. Inserted only if absent.
    pub created: Option<ActionHandlerEntry>,
    pub uses: u64,
    pub confidence_delta: i32,
    pub used_at: Option<Timestamp>,
}

/// Persistence for the knowledge store.
pub trait KnowledgeBackend {
    /// Read every entry.
    fn load(&self) -> Result<Vec<ActionHandlerEntry>, StorageError>;

    /// Additively merge a run's changes. Entries not named are untouched.
    fn merge(&self, changes: &[HandlerChange]) -> Result<(), StorageError>;
}

/// In-process backend for ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, ActionHandlerEntry>>,
}

impl KnowledgeBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<ActionHandlerEntry>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.values().cloned().collect())
    }

    fn merge(&self, changes: &[HandlerChange]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        for change in changes {
            if let Some(created) = &change.created {
                entries
                    .entry(change.kind.clone())
                    .or_insert_with(|| created.clone());
            }
            if let Some(entry) = entries.get_mut(&change.kind) {
                entry.apply(change);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SessionUse {
    created: bool,
    uses: u64,
    wrong: bool,
}

/// The knowledge store as seen by one run.
#[derive(Debug, Default)]
pub struct KnowledgeStore {
    entries: BTreeMap<String, ActionHandlerEntry>,
    session: BTreeMap<String, SessionUse>,
    last_used: Option<Timestamp>,
}

impl KnowledgeStore {
    /// Load every entry from the backend.
    pub fn load(backend: &dyn KnowledgeBackend) -> Result<Self, StorageError> {
        let entries = backend
            .load()?
            .into_iter()
            .map(|e| (e.kind.clone(), e))
            .collect();
        Ok(Self {
            entries,
            ..Self::default()
        })
    }

    pub fn get(&self, kind: &str) -> Option<&ActionHandlerEntry> {
        self.entries.get(kind)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ActionHandlerEntry> {
        self.entries.values()
    }

    /// The stored template for `kind`, counting one use. `None` if unknown.
    pub fn use_strategy(&mut self, kind: &str) -> Option<String> {
        let entry = self.entries.get_mut(kind)?;
        entry.usage_count += 1;
        let template = entry.template.clone();
        self.session.entry(kind.to_string()).or_default().uses += 1;
        self.last_used = Some(Timestamp::now());
        Some(template)
    }

    /// Register a new low-confidence strategy and count its first use.
    pub fn register(&mut self, kind: &str, template: String) {
        let now = Timestamp::now();
        let mut entry = ActionHandlerEntry::learned(kind, template, now);
        entry.usage_count = 1;
        entry.last_used = Some(now);
        self.entries.insert(kind.to_string(), entry);
        let session = self.session.entry(kind.to_string()).or_default();
        session.created = true;
        session.uses += 1;
        self.last_used = Some(now);
    }

    /// Record that this run's output for `kind` was semantically wrong.
    ///
    /// Returns `false` if the kind has no entry.
    pub fn report_wrong(&mut self, kind: &str) -> bool {
        if !self.entries.contains_key(kind) {
            return false;
        }
        self.session.entry(kind.to_string()).or_default().wrong = true;
        true
    }

    /// The deltas this run will merge into the backend.
    pub fn changes(&self) -> Vec<HandlerChange> {
        self.session
            .iter()
            .filter_map(|(kind, session)| {
                let entry = self.entries.get(kind)?;
                let confidence_delta = if session.wrong {
                    -WRONG_OUTPUT_PENALTY
                } else if session.uses > 0 && !session.created {
                    CLEAN_USE_BONUS
                } else {
                    0
                };
                let created = session.created.then(|| ActionHandlerEntry {
                    usage_count: 0,
                    last_used: None,
                    ..entry.clone()
                });
                Some(HandlerChange {
                    kind: kind.clone(),
                    created,
                    uses: session.uses,
                    confidence_delta,
                    used_at: if session.uses > 0 { self.last_used } else { None },
                })
            })
            .collect()
    }

    /// Merge this run's changes into the backend.
    pub fn save(&self, backend: &dyn KnowledgeBackend) -> Result<(), StorageError> {
        let changes = self.changes();
        if changes.is_empty() {
            return Ok(());
        }
        tracing::debug!(changes = changes.len(), "merging action knowledge");
        backend.merge(&changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(backend: &MemoryBackend) -> KnowledgeStore {
        KnowledgeStore::load(backend).unwrap()
    }

    #[test]
    fn synthesized_template_lowercases_kind() {
        assert_eq!(synthesize_template("HIGHLIGHT"), "highlight {subject}");
        assert_eq!(
            synthesize_template("DRAG_AND_DROP"),
            "drag and drop {subject}"
        );
    }

    #[test]
    fn register_then_save_creates_low_confidence_entry() {
        let backend = MemoryBackend::default();
        let mut store = loaded(&backend);
        store.register("HIGHLIGHT", synthesize_template("HIGHLIGHT"));
        store.save(&backend).unwrap();

        let entries = backend.load().unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.kind, "HIGHLIGHT");
        assert_eq!(entry.confidence, INITIAL_CONFIDENCE);
        assert_eq!(entry.usage_count, 1);
        assert!(entry.learned);
        assert!(entry.needs_review);
    }

    #[test]
    fn clean_reuse_raises_confidence() {
        let backend = MemoryBackend::default();
        let mut first = loaded(&backend);
        first.register("HIGHLIGHT", synthesize_template("HIGHLIGHT"));
        first.save(&backend).unwrap();

        let mut second = loaded(&backend);
        assert_eq!(
            second.use_strategy("HIGHLIGHT").as_deref(),
            Some("highlight {subject}")
        );
        second.use_strategy("HIGHLIGHT");
        second.save(&backend).unwrap();

        let entry = loaded(&backend).get("HIGHLIGHT").cloned().unwrap();
        assert_eq!(entry.usage_count, 3);
        assert_eq!(
            i32::from(entry.confidence),
            i32::from(INITIAL_CONFIDENCE) + CLEAN_USE_BONUS
        );
    }

    #[test]
    fn wrong_output_lowers_confidence() {
        let backend = MemoryBackend::default();
        let mut first = loaded(&backend);
        first.register("HIGHLIGHT", synthesize_template("HIGHLIGHT"));
        first.save(&backend).unwrap();

        let mut second = loaded(&backend);
        second.use_strategy("HIGHLIGHT");
        assert!(second.report_wrong("HIGHLIGHT"));
        assert!(!second.report_wrong("NEVER_SEEN"));
        second.save(&backend).unwrap();

        let entry = loaded(&backend).get("HIGHLIGHT").cloned().unwrap();
        assert_eq!(entry.confidence, 5);
        assert!(entry.needs_review);
    }

    #[test]
    fn merge_is_additive_across_runs() {
        let backend = MemoryBackend::default();
        let mut seed = loaded(&backend);
        seed.register("HIGHLIGHT", synthesize_template("HIGHLIGHT"));
        seed.register("SHAKE", synthesize_template("SHAKE"));
        seed.save(&backend).unwrap();

        // Two runs load the same snapshot, then save in turn.
        let mut a = loaded(&backend);
        let mut b = loaded(&backend);
        a.use_strategy("HIGHLIGHT");
        b.use_strategy("HIGHLIGHT");
        b.register("WIGGLE", synthesize_template("WIGGLE"));
        a.save(&backend).unwrap();
        b.save(&backend).unwrap();

        let store = loaded(&backend);
        assert_eq!(store.get("HIGHLIGHT").unwrap().usage_count, 3);
        assert_eq!(store.get("SHAKE").unwrap().usage_count, 1);
        assert!(store.get("WIGGLE").is_some());
    }

    #[test]
    fn unused_store_saves_nothing() {
        let backend = MemoryBackend::default();
        let store = loaded(&backend);
        assert!(store.changes().is_empty());
        store.save(&backend).unwrap();
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn review_flag_clears_at_threshold() {
        let now = Timestamp::now();
        let mut entry = ActionHandlerEntry::learned("X", "x {subject}".into(), now);
        entry.confidence = REVIEW_THRESHOLD - 1;
        entry.apply(&HandlerChange {
            kind: "X".into(),
            created: None,
            uses: 1,
            confidence_delta: CLEAN_USE_BONUS,
            used_at: Some(now),
        });
        assert!(!entry.needs_review);
        assert_eq!(entry.last_used, Some(now));
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(clamp_confidence(-10), 0);
        assert_eq!(clamp_confidence(150), 100);
        assert_eq!(clamp_confidence(42), 42);
    }
}
