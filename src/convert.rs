//! Step-to-text conversion.
//!
//! Each known action kind has a handler that renders exactly one line.
//! Kinds without a handler go to the knowledge store: a learned template
//! if one exists, otherwise a synthesized one that is registered for
//! review and reported as a diagnostic.
//!
//! Formatting is uniform across handlers: variables render as `$name`,
//! URLs and selector display strings are quoted, numbers are not.

mod assert;
mod context;
mod data;
mod fallback;
mod interact;
mod phrase;

use crate::knowledge::KnowledgeStore;
use crate::model::{Action, ApiCatalog, Diagnostic, DiagnosticKind, Step, location};
use crate::selector::Resolution;

use phrase::{TargetPhrase, View};

/// Converts steps to text for one run.
pub struct Converter<'a> {
    knowledge: &'a mut KnowledgeStore,
    catalog: &'a ApiCatalog,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Converter<'a> {
    pub fn new(knowledge: &'a mut KnowledgeStore, catalog: &'a ApiCatalog) -> Self {
        Self {
            knowledge,
            catalog,
            diagnostics: Vec::new(),
        }
    }

    /// Render one step.
    ///
    /// `resolution` is the selector resolver's output for the step's target;
    /// `None` when the step has no target. `checkpoint` and `step_number`
    /// are 1-based and only used in diagnostics.
    pub fn convert(
        &mut self,
        step: &Step,
        resolution: Option<&Resolution>,
        checkpoint: usize,
        step_number: usize,
    ) -> String {
        let at = location(checkpoint, step_number);
        let target = self.target_phrase(step, resolution, &at);
        let view = View::new(step, target);

        let line = match &step.action {
            Action::Navigate(meta) => interact::navigate(meta, &view),
            Action::Write(meta) => interact::write(meta, &view),
            Action::Click => interact::click(&view),
            Action::Mouse(meta) => interact::mouse(meta, &view),
            Action::Select(meta) => interact::select(meta, &view),
            Action::Press => interact::press(&view),
            Action::Upload => interact::upload(&view),
            Action::Assert(assertion) => assert::assertion(assertion, &view),
            Action::WaitForElement(meta) => context::wait_for_element(meta, &view),
            Action::WaitForTime(meta) => context::wait_for_time(meta, &view),
            Action::Scroll(meta) => context::scroll(meta, &view),
            Action::Switch(meta) => context::switch(meta, &view),
            Action::Window(meta) => context::window(meta),
            Action::Dismiss(meta) => context::dismiss(meta, &view),
            Action::Cookie(meta) => context::cookie(meta, &view),
            Action::Store => data::store(&view),
            Action::Environment(meta) => data::environment(meta, &view),
            Action::ApiCall(meta) => data::api_call(meta, &view, self.catalog),
            Action::Execute => data::execute(&view),
            Action::Comment => data::comment(&view),
            Action::Unknown { kind } => self.unknown(kind, &view, &at),
        };
        tracing::trace!(kind = step.action.kind(), %line, "converted step");
        line
    }

    /// Diagnostics collected so far, in emission order.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn target_phrase(
        &mut self,
        step: &Step,
        resolution: Option<&Resolution>,
        at: &str,
    ) -> Option<TargetPhrase> {
        let Some(target) = step.target.as_ref() else {
            if step.action.expects_target() {
                self.no_selector(step, at);
            }
            return None;
        };

        for malformed in &target.malformed {
            tracing::warn!(%malformed, "skipping malformed selector at {at}");
            self.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::MalformedSelector,
                detail: format!("{malformed} at {at}"),
                fallback_used: "skipped; resolution continued with the remaining selectors"
                    .to_string(),
                suggested_fix: format!("re-record the {} selector", malformed.tag),
            });
        }

        if let Some(Resolution::Selector(display)) = resolution {
            return Some(TargetPhrase::from_display(display));
        }
        if let Some(variable) = target.guess_variables().next() {
            return Some(TargetPhrase::Variable(variable.to_string()));
        }
        self.no_selector(step, at);
        Some(TargetPhrase::Element)
    }

    fn no_selector(&mut self, step: &Step, at: &str) {
        self.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::NoSelector,
            detail: format!(
                "no usable selector for {} at {at}",
                step.action.kind()
            ),
            fallback_used: "rendered the target as a generic \"element\"".to_string(),
            suggested_fix: "add a hint, id, or xpath selector to the step's element".to_string(),
        });
    }
}
