//! Core data model for narrate.
//!
//! Journeys, checkpoints, and steps as they arrive from the test platform,
//! the execution and environment records that bind variable values, and the
//! records the conversion produces: variable reports and diagnostics.

mod diagnostic;
mod journey;
mod scalar;
mod selector;
mod sources;
mod step;
mod variable;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub(crate) use diagnostic::location;
pub use journey::Journey;
pub use selector::{GuessSelector, SelectorEncoding, XPathKind};
pub use sources::{ApiCatalog, Environment, Execution};
pub use step::{
    Action, ApiCallMeta, Assertion, ComparisonOperator, CookieKind, CookieMeta, DismissKind,
    DismissMeta, EnvironmentKind, EnvironmentMeta, InputBindings, MouseAction, MouseMeta,
    NavigateMeta, ScrollKind, ScrollMeta, SelectKind, SelectMeta, Step, SwitchKind, SwitchMeta,
    VariableComparison, WaitMeta, WindowKind, WindowMeta, WriteMeta,
};
pub use variable::{
    Classification, Constraint, Format, SourceCategory, UsageContext, VariableRecord,
    VariableReference, VariableReport, VariableUsage,
};

/// Strips the `$` marker and `${...}` braces from a variable name.
///
/// Step records are inconsistent about whether the marker is included,
/// so every name is normalized before it is stored or compared.
pub fn bare_variable_name(raw: &str) -> &str {
    let name = raw.trim();
    let name = name.strip_prefix('$').unwrap_or(name);
    name.strip_prefix('{')
        .and_then(|n| n.strip_suffix('}'))
        .unwrap_or(name)
        .trim()
}

/// The name inside `$name` or `${name}`, if `raw` is exactly a variable reference.
pub fn variable_reference(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    if !raw.starts_with('$') {
        return None;
    }
    let name = bare_variable_name(raw);
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    valid.then_some(name)
}
