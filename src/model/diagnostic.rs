//! Diagnostics: non-fatal conditions an operator should see.

use std::fmt;

use serde::Serialize;

/// What kind of degradation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    UnknownAction,
    UnresolvedVariable,
    NoSelector,
    MalformedSelector,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnknownAction => "unknown-action",
            Self::UnresolvedVariable => "unresolved-variable",
            Self::NoSelector => "no-selector",
            Self::MalformedSelector => "malformed-selector",
        };
        f.write_str(s)
    }
}

/// One diagnostic entry. Never a failure; always a fallback that was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub detail: String,
    pub fallback_used: String,
    pub suggested_fix: String,
}

/// A 1-based step position, for diagnostic details.
pub(crate) fn location(checkpoint: usize, step: usize) -> String {
    format!("checkpoint {checkpoint} step {step}")
}
