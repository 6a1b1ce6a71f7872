//! Output formatting for CLI display.

use serde::Serialize;

use crate::knowledge::ActionHandlerEntry;
use crate::model::{Constraint, Diagnostic, VariableRecord};

/// One knowledge store entry on one line.
pub(super) fn format_entry(entry: &ActionHandlerEntry) -> String {
    let mut flags = Vec::new();
    if entry.learned {
        flags.push("learned");
    }
    if entry.needs_review {
        flags.push("needs review");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!("  [{}]", flags.join(", "))
    };
    format!(
        "{}  confidence {}  used {}{flags}  {:?}",
        entry.kind, entry.confidence, entry.usage_count, entry.template
    )
}

/// One variable report entry on one line. Credential values are masked.
pub(super) fn format_variable(record: &VariableRecord) -> String {
    let value = if record.classification.constraint == Constraint::Credential {
        "********".to_string()
    } else {
        format!("{:?}", record.value)
    };
    format!(
        "${} = {value}  ({}, {})",
        record.name,
        wire_name(&record.source),
        wire_name(&record.classification.constraint),
    )
}

/// The serialized name of a unit enum variant, e.g. `test-data`.
fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

/// One diagnostic for stderr.
pub(super) fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    format!(
        "{}: {}\n  fallback: {}\n  fix: {}",
        diagnostic.kind, diagnostic.detail, diagnostic.fallback_used, diagnostic.suggested_fix
    )
}
