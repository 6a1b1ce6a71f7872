//! The variable report: scan usage, resolve values, classify.
//!
//! Runs independently of text conversion and shares only the journey.

mod classify;
mod resolve;
mod scan;

pub use classify::classify;
pub use resolve::{LocalValues, Resolved, SELECTOR_PLACEHOLDER, Sources, resolve};
pub use scan::scan;

use crate::model::{
    Diagnostic, DiagnosticKind, Journey, SourceCategory, VariableRecord, VariableReport, location,
};

/// Build the report for one journey.
///
/// Variables that resolve to nothing are left out and reported as
/// `unresolved-variable` diagnostics.
pub fn report(journey: &Journey, sources: &Sources<'_>) -> (VariableReport, Vec<Diagnostic>) {
    let locals = LocalValues::from_journey(journey);
    let mut records = Vec::new();
    let mut diagnostics = Vec::new();

    for usage in scan(journey) {
        let (value, source) = match resolve(&usage, sources, &locals) {
            Resolved::Value { value, source } => (value, source),
            Resolved::Placeholder => (SELECTOR_PLACEHOLDER.to_string(), SourceCategory::Local),
            Resolved::Unresolved => {
                let first = &usage.references[0];
                tracing::debug!(name = %usage.name, "variable has no value");
                diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::UnresolvedVariable,
                    detail: format!(
                        "${} first used at {} has no non-empty value",
                        usage.name,
                        location(first.checkpoint, first.step)
                    ),
                    fallback_used: "omitted from the variable report".to_string(),
                    suggested_fix: format!(
                        "bind ${} in the journey's data attributes, the execution's initial data, or the environment",
                        usage.name
                    ),
                });
                continue;
            }
        };
        let classification = classify(&usage, &value, &sources.execution.test_data_rows);
        records.push(VariableRecord {
            name: usage.name,
            value,
            source,
            classification,
            usages: usage.references,
        });
    }

    tracing::debug!(
        resolved = records.len(),
        unresolved = diagnostics.len(),
        "built variable report"
    );
    (VariableReport { records }, diagnostics)
}
