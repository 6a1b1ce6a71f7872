//! Shared phrase building: how targets, values, and variables read in a line.

use std::fmt;

use crate::model::{Step, variable_reference};

/// How a step's target appears in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum TargetPhrase {
    /// A resolved selector, quoted.
    Selector(String),

    /// A runtime variable locating the element.
    Variable(String),

    /// Nothing usable; the generic word `element`.
    Element,
}

impl TargetPhrase {
    /// A selector display string. `$name` and `${name}` stay variable references.
    pub(super) fn from_display(display: &str) -> Self {
        match variable_reference(display) {
            Some(name) => Self::Variable(name.to_string()),
            None => Self::Selector(display.to_string()),
        }
    }
}

impl fmt::Display for TargetPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(s) => f.write_str(&quote(s)),
            Self::Variable(name) => write!(f, "${name}"),
            Self::Element => f.write_str("element"),
        }
    }
}

/// Double-quote a literal, escaping embedded quotes.
pub(super) fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\\\""))
}

/// A literal value as it reads in text: `$name` for references, quoted otherwise.
pub(super) fn value_phrase(value: &str) -> String {
    match variable_reference(value) {
        Some(name) => format!("${name}"),
        None => quote(value),
    }
}

/// Formats a millisecond duration, preferring whole seconds.
pub(super) fn duration(ms: u64) -> String {
    match ms {
        1000 => "1 second".to_string(),
        ms if ms % 1000 == 0 => format!("{} seconds", ms / 1000),
        1 => "1 millisecond".to_string(),
        ms => format!("{ms} milliseconds"),
    }
}

/// One step plus its rendered target, with the lookups handlers share.
pub(super) struct View<'a> {
    pub step: &'a Step,
    pub target: Option<TargetPhrase>,
}

impl<'a> View<'a> {
    pub(super) fn new(step: &'a Step, target: Option<TargetPhrase>) -> Self {
        Self { step, target }
    }

    /// The target phrase, if the step has a target.
    pub(super) fn target(&self) -> Option<String> {
        self.target.as_ref().map(ToString::to_string)
    }

    /// The target phrase, or `element` when the step has none.
    pub(super) fn target_or_element(&self) -> String {
        self.target().unwrap_or_else(|| "element".to_string())
    }

    /// The variable slot as `$name`.
    pub(super) fn variable(&self) -> Option<String> {
        self.step.variable.as_deref().map(|v| format!("${v}"))
    }

    /// The literal value, quoted unless it is itself a reference.
    pub(super) fn value(&self) -> Option<String> {
        self.step.value.as_deref().map(value_phrase)
    }

    /// What the step supplies as data: its variable if bound, else its value.
    pub(super) fn input(&self) -> Option<String> {
        self.variable().or_else(|| self.value())
    }

    /// What the step acts on: its target, else its input, else `element`.
    pub(super) fn subject(&self) -> String {
        self.target()
            .or_else(|| self.input())
            .unwrap_or_else(|| "element".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_quote_unless_referenced() {
        assert_eq!(value_phrase("hello"), "\"hello\"");
        assert_eq!(value_phrase("${total}"), "$total");
        assert_eq!(value_phrase("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn selector_display_that_is_a_reference_stays_unquoted() {
        assert_eq!(TargetPhrase::from_display("$box").to_string(), "$box");
        assert_eq!(TargetPhrase::from_display("Login").to_string(), "\"Login\"");
        assert_eq!(TargetPhrase::Element.to_string(), "element");
    }

    #[test]
    fn durations_prefer_seconds() {
        assert_eq!(duration(1000), "1 second");
        assert_eq!(duration(5000), "5 seconds");
        assert_eq!(duration(1500), "1500 milliseconds");
    }
}
