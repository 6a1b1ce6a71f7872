//! Rendering for action kinds without a built-in handler.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::knowledge::synthesize_template;
use crate::model::{Diagnostic, DiagnosticKind};

use super::Converter;
use super::phrase::View;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"( ?)\{(\w+)\}").expect("valid placeholder pattern"));

impl Converter<'_> {
    /// Render an unknown kind through the knowledge store.
    ///
    /// The first sighting of a kind registers a synthesized template and
    /// emits one diagnostic. Later steps of the same kind, in this run or
    /// any other, reuse the stored template silently.
    pub(super) fn unknown(&mut self, kind: &str, view: &View<'_>, at: &str) -> String {
        let template = if let Some(template) = self.knowledge.use_strategy(kind) {
            tracing::debug!(kind, %template, "using stored strategy");
            template
        } else {
            let template = synthesize_template(kind);
            self.knowledge.register(kind, template.clone());
            tracing::info!(kind, %template, "registered strategy for unknown action");
            self.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::UnknownAction,
                detail: format!("unknown action kind {kind} at {at}"),
                fallback_used: format!("synthesized template \"{template}\", pending review"),
                suggested_fix: format!(
                    "add a {kind} handler, or teach one: narrate knowledge promote {kind} --template \"...\""
                ),
            });
            template
        };

        let line = render(&template, view);
        if line.is_empty() {
            kind.to_lowercase().replace('_', " ")
        } else {
            line
        }
    }
}

/// Fill `{subject}`, `{target}`, `{value}`, `{variable}` from the step.
///
/// An empty slot also drops the space before it. Unrecognized placeholders
/// are left in place.
fn render(template: &str, view: &View<'_>) -> String {
    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        let slot = match &caps[2] {
            "subject" => Some(Some(view.subject())),
            "target" => Some(view.target()),
            "value" => Some(view.value()),
            "variable" => Some(view.variable()),
            _ => None,
        };
        match slot {
            Some(Some(text)) => format!("{}{text}", &caps[1]),
            Some(None) => String::new(),
            None => caps[0].to_string(),
        }
    });
    rendered.trim().to_string()
}
