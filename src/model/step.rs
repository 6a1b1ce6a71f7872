//! Steps: one action with its kind-specific metadata.
//!
//! On the wire a step is a loose record (`action`, `variable`, `value`,
//! `element`, `meta`). It is parsed once into [`Step`], where the action
//! kind and its metadata become one variant of [`Action`]. Parsing never
//! fails: unknown kinds become [`Action::Unknown`] and metadata of the wrong
//! shape is replaced by the empty shape.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::scalar;
use super::selector::{SelectorRecord, Target};

/// One step of a checkpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "StepRecord")]
pub struct Step {
    pub action: Action,

    /// The variable slot, normalized without the `$` marker.
    pub variable: Option<String>,

    /// The literal value, if any. Empty strings are treated as absent.
    pub value: Option<String>,

    /// The element acted on, if the step has one.
    pub target: Option<Target>,
}

/// What a step does. One variant per known action kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(NavigateMeta),
    Write(WriteMeta),
    Click,
    Mouse(MouseMeta),
    Select(SelectMeta),
    Press,
    WaitForElement(WaitMeta),
    WaitForTime(WaitMeta),
    Assert(Assertion),
    Store,
    Scroll(ScrollMeta),
    Switch(SwitchMeta),
    Environment(EnvironmentMeta),
    ApiCall(ApiCallMeta),
    Execute,
    Window(WindowMeta),
    Upload,
    Dismiss(DismissMeta),
    Cookie(CookieMeta),
    Comment,

    /// A kind with no built-in handler. Carries the normalized kind name.
    Unknown { kind: String },
}

/// The assertion variants, each with its own shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    Exists,
    NotExists,
    Equals,
    NotEquals,
    Checked,
    Selected,
    Matches,
    GreaterThan,
    LessThan,
    Variable(VariableComparison),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigateMeta {
    pub use_new_tab: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WriteMeta {
    pub append: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MouseMeta {
    pub action: Option<MouseAction>,
    pub x: Option<i64>,
    pub y: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MouseAction {
    Click,
    DoubleClick,
    RightClick,
    Hover,
    Move,
    Down,
    Up,
    Enter,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectMeta {
    #[serde(rename = "type")]
    pub kind: Option<SelectKind>,
    pub index: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectKind {
    Value,
    Index,
    Last,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaitMeta {
    #[serde(alias = "timeout")]
    pub timeout_ms: Option<u64>,
    #[serde(alias = "duration")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VariableComparison {
    #[serde(rename = "type", alias = "operator")]
    pub operator: Option<ComparisonOperator>,

    /// A second variable to compare against, instead of the literal value.
    #[serde(deserialize_with = "scalar::optional")]
    pub operand_variable: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Contains,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrollMeta {
    #[serde(rename = "type")]
    pub kind: Option<ScrollKind>,
    #[serde(deserialize_with = "scalar::optional")]
    pub direction: Option<String>,
    pub x: Option<i64>,
    pub y: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrollKind {
    Bottom,
    Top,
    Element,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SwitchMeta {
    #[serde(rename = "type")]
    pub kind: Option<SwitchKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwitchKind {
    ParentFrame,
    #[serde(alias = "IFRAME", alias = "FRAME_BY_ELEMENT")]
    Frame,
    NextWindow,
    PreviousWindow,
    Window,
    NextTab,
    PreviousTab,
    Tab,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentMeta {
    #[serde(rename = "type")]
    pub kind: Option<EnvironmentKind>,
    #[serde(deserialize_with = "scalar::optional")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentKind {
    Set,
    Add,
    Delete,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiCallMeta {
    #[serde(alias = "apiId", deserialize_with = "scalar::optional")]
    pub api_test_id: Option<String>,
    #[serde(deserialize_with = "scalar::optional")]
    pub name: Option<String>,
    pub input_variables: Option<InputBindings>,
    #[serde(deserialize_with = "scalar::optional")]
    pub output_variable: Option<String>,
}

/// Variables bound to an API call's inputs.
///
/// Some records name the parameters; others list only the variables, in
/// parameter order, and rely on a catalog lookup for the names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InputBindings {
    Named(BTreeMap<String, String>),
    Positional(Vec<String>),
}

impl InputBindings {
    /// The bound variable names, normalized, in binding order.
    pub fn variables(&self) -> Vec<&str> {
        let names: Vec<&str> = match self {
            Self::Named(map) => map.values().map(String::as_str).collect(),
            Self::Positional(list) => list.iter().map(String::as_str).collect(),
        };
        names
            .into_iter()
            .map(super::bare_variable_name)
            .filter(|n| !n.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowMeta {
    #[serde(rename = "type")]
    pub kind: Option<WindowKind>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowKind {
    Resize,
    Maximize,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DismissMeta {
    #[serde(rename = "type")]
    pub kind: Option<DismissKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DismissKind {
    Alert,
    Confirm,
    Prompt,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CookieMeta {
    #[serde(rename = "type")]
    pub kind: Option<CookieKind>,
    #[serde(deserialize_with = "scalar::optional")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CookieKind {
    Create,
    Delete,
    Wipe,
    #[serde(other)]
    Other,
}

impl Action {
    /// Build an action from its wire kind and metadata.
    fn parse(kind: &str, meta: Option<&Value>) -> Self {
        let kind = kind.trim().to_ascii_uppercase();
        match kind.as_str() {
            "NAVIGATE" => Self::Navigate(decode(&kind, meta)),
            "WRITE" => Self::Write(decode(&kind, meta)),
            "CLICK" => Self::Click,
            "MOUSE" => Self::Mouse(decode(&kind, meta)),
            "DOUBLE_CLICK" => Self::Mouse(mouse(MouseAction::DoubleClick)),
            "RIGHT_CLICK" => Self::Mouse(mouse(MouseAction::RightClick)),
            "HOVER" => Self::Mouse(mouse(MouseAction::Hover)),
            "SELECT" | "PICK" => Self::Select(decode(&kind, meta)),
            "PRESS" => Self::Press,
            "WAIT_FOR_ELEMENT" => Self::WaitForElement(decode(&kind, meta)),
            "WAIT_FOR_TIME" | "WAIT" => Self::WaitForTime(decode(&kind, meta)),
            "ASSERT_EXISTS" => Self::Assert(Assertion::Exists),
            "ASSERT_NOT_EXISTS" => Self::Assert(Assertion::NotExists),
            "ASSERT_EQUALS" => Self::Assert(Assertion::Equals),
            "ASSERT_NOT_EQUALS" => Self::Assert(Assertion::NotEquals),
            "ASSERT_CHECKED" => Self::Assert(Assertion::Checked),
            "ASSERT_SELECTED" => Self::Assert(Assertion::Selected),
            "ASSERT_MATCHES" => Self::Assert(Assertion::Matches),
            "ASSERT_GREATER_THAN" => Self::Assert(Assertion::GreaterThan),
            "ASSERT_LESS_THAN" => Self::Assert(Assertion::LessThan),
            "ASSERT_VARIABLE" => Self::Assert(Assertion::Variable(decode(&kind, meta))),
            "STORE" => Self::Store,
            "SCROLL" => Self::Scroll(decode(&kind, meta)),
            "SWITCH" => Self::Switch(decode(&kind, meta)),
            "ENVIRONMENT" => Self::Environment(decode(&kind, meta)),
            "API_CALL" => Self::ApiCall(decode(&kind, meta)),
            "EXECUTE" => Self::Execute,
            "WINDOW" => Self::Window(decode(&kind, meta)),
            "UPLOAD" => Self::Upload,
            "DISMISS" => Self::Dismiss(decode(&kind, meta)),
            "COOKIE" => Self::Cookie(decode(&kind, meta)),
            "COMMENT" => Self::Comment,
            _ => Self::Unknown { kind: kind.clone() },
        }
    }

    /// The action kind name, as it appears on the wire.
    pub fn kind(&self) -> &str {
        match self {
            Self::Navigate(_) => "NAVIGATE",
            Self::Write(_) => "WRITE",
            Self::Click => "CLICK",
            Self::Mouse(_) => "MOUSE",
            Self::Select(_) => "SELECT",
            Self::Press => "PRESS",
            Self::WaitForElement(_) => "WAIT_FOR_ELEMENT",
            Self::WaitForTime(_) => "WAIT_FOR_TIME",
            Self::Assert(assertion) => match assertion {
                Assertion::Exists => "ASSERT_EXISTS",
                Assertion::NotExists => "ASSERT_NOT_EXISTS",
                Assertion::Equals => "ASSERT_EQUALS",
                Assertion::NotEquals => "ASSERT_NOT_EQUALS",
                Assertion::Checked => "ASSERT_CHECKED",
                Assertion::Selected => "ASSERT_SELECTED",
                Assertion::Matches => "ASSERT_MATCHES",
                Assertion::GreaterThan => "ASSERT_GREATER_THAN",
                Assertion::LessThan => "ASSERT_LESS_THAN",
                Assertion::Variable(_) => "ASSERT_VARIABLE",
            },
            Self::Store => "STORE",
            Self::Scroll(_) => "SCROLL",
            Self::Switch(_) => "SWITCH",
            Self::Environment(_) => "ENVIRONMENT",
            Self::ApiCall(_) => "API_CALL",
            Self::Execute => "EXECUTE",
            Self::Window(_) => "WINDOW",
            Self::Upload => "UPLOAD",
            Self::Dismiss(_) => "DISMISS",
            Self::Cookie(_) => "COOKIE",
            Self::Comment => "COMMENT",
            Self::Unknown { kind } => kind,
        }
    }

    /// Whether the action is directed at an element, so a missing target is a defect.
    pub fn expects_target(&self) -> bool {
        match self {
            Self::Click | Self::Select(_) | Self::Upload | Self::WaitForElement(_) => true,
            Self::Mouse(meta) => meta.action != Some(MouseAction::Move),
            Self::Assert(assertion) => !matches!(assertion, Assertion::Variable(_)),
            Self::Scroll(meta) => meta.kind == Some(ScrollKind::Element),
            _ => false,
        }
    }
}

fn mouse(action: MouseAction) -> MouseMeta {
    MouseMeta {
        action: Some(action),
        ..MouseMeta::default()
    }
}

/// Decode kind-specific metadata, falling back to the empty shape.
fn decode<T: DeserializeOwned + Default>(kind: &str, meta: Option<&Value>) -> T {
    match meta {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::warn!(kind, error = %e, "ignoring metadata of unexpected shape");
            T::default()
        }),
    }
}

/// A step as it appears on the wire.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepRecord {
    action: String,
    #[serde(default, deserialize_with = "scalar::optional")]
    variable: Option<String>,
    #[serde(default, deserialize_with = "scalar::optional")]
    value: Option<String>,
    #[serde(default)]
    element: Option<ElementRecord>,
    #[serde(default)]
    meta: Option<Value>,
}

#[derive(Deserialize)]
struct ElementRecord {
    #[serde(default)]
    target: Option<TargetRecord>,
}

#[derive(Deserialize)]
struct TargetRecord {
    #[serde(default)]
    selectors: Vec<SelectorRecord>,
}

impl From<StepRecord> for Step {
    fn from(record: StepRecord) -> Self {
        let action = Action::parse(&record.action, record.meta.as_ref());
        let variable = record
            .variable
            .as_deref()
            .map(super::bare_variable_name)
            .filter(|v| !v.is_empty())
            .map(String::from);
        let target = record
            .element
            .and_then(|e| e.target)
            .map(|t| Target::from_records(t.selectors));
        Self {
            action,
            variable,
            value: record.value,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::model::SelectorEncoding;

    fn step(value: Value) -> Step {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_write_with_hint_target() {
        let s = step(json!({
            "action": "WRITE",
            "variable": "$username",
            "element": { "target": { "selectors": [ { "type": "HINT", "value": "Username" } ] } }
        }));
        assert_eq!(s.action, Action::Write(WriteMeta::default()));
        assert_eq!(s.variable.as_deref(), Some("username"));
        let target = s.target.unwrap();
        assert_eq!(target.encodings, vec![SelectorEncoding::Hint("Username".into())]);
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let s = step(json!({ "action": "highlight_element" }));
        assert_eq!(
            s.action,
            Action::Unknown {
                kind: "HIGHLIGHT_ELEMENT".into()
            }
        );
        assert_eq!(s.action.kind(), "HIGHLIGHT_ELEMENT");
    }

    #[test]
    fn element_directed_kinds_expect_a_target() {
        let expects = |value: Value| step(value).action.expects_target();
        assert!(expects(json!({ "action": "CLICK" })));
        assert!(expects(json!({ "action": "HOVER" })));
        assert!(expects(json!({ "action": "ASSERT_EXISTS" })));
        assert!(expects(json!({ "action": "SCROLL", "meta": { "type": "ELEMENT" } })));
        assert!(!expects(json!({ "action": "SCROLL", "meta": { "type": "TOP" } })));
        assert!(!expects(json!({ "action": "MOUSE", "meta": { "action": "MOVE", "x": 1, "y": 2 } })));
        assert!(!expects(json!({ "action": "ASSERT_VARIABLE" })));
        assert!(!expects(json!({ "action": "NAVIGATE", "value": "https://x" })));
        assert!(!expects(json!({ "action": "WIGGLE" })));
    }

    #[test]
    fn typed_metadata_is_decoded() {
        let s = step(json!({ "action": "SCROLL", "meta": { "type": "BOTTOM" } }));
        assert_eq!(
            s.action,
            Action::Scroll(ScrollMeta {
                kind: Some(ScrollKind::Bottom),
                ..ScrollMeta::default()
            })
        );

        let s = step(json!({ "action": "ASSERT_VARIABLE", "meta": { "type": "LESS_THAN_OR_EQUAL" } }));
        assert_eq!(
            s.action,
            Action::Assert(Assertion::Variable(VariableComparison {
                operator: Some(ComparisonOperator::LessThanOrEqual),
                operand_variable: None,
            }))
        );
    }

    #[test]
    fn unknown_sub_kind_maps_to_other() {
        let s = step(json!({ "action": "SWITCH", "meta": { "type": "POPUP" } }));
        assert_eq!(
            s.action,
            Action::Switch(SwitchMeta {
                kind: Some(SwitchKind::Other)
            })
        );
    }

    #[test]
    fn wrong_metadata_shape_falls_back_to_empty() {
        let s = step(json!({ "action": "WINDOW", "meta": { "width": "wide" } }));
        assert_eq!(s.action, Action::Window(WindowMeta::default()));
    }

    #[test]
    fn api_bindings_accept_both_shapes() {
        let s = step(json!({
            "action": "API_CALL",
            "meta": { "apiTestId": 77, "inputVariables": { "user": "$username" } }
        }));
        let Action::ApiCall(meta) = s.action else {
            panic!("expected API call");
        };
        assert_eq!(meta.api_test_id.as_deref(), Some("77"));
        assert_eq!(meta.input_variables.unwrap().variables(), vec!["username"]);

        let s = step(json!({
            "action": "API_CALL",
            "meta": { "inputVariables": ["a", "$b"] }
        }));
        let Action::ApiCall(meta) = s.action else {
            panic!("expected API call");
        };
        assert_eq!(meta.input_variables.unwrap().variables(), vec!["a", "b"]);
    }

    #[test]
    fn mouse_aliases() {
        let s = step(json!({ "action": "DOUBLE_CLICK" }));
        assert_eq!(s.action, Action::Mouse(mouse(MouseAction::DoubleClick)));
    }
}
