//! Selector encodings: the ways a step identifies its UI target.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One way of identifying a UI element.
///
/// A step's target carries zero or more of these. Resolution picks one
/// of them by priority; it never merges two variants into one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEncoding {
    /// Human label, e.g. the text a tester typed when recording.
    Hint(String),

    /// Visible text of the element.
    Text(String),

    /// DOM id.
    Id(String),

    /// An `XPath` expression, sub-typed by what it anchors on.
    XPath { kind: XPathKind, expression: String },

    /// A CSS selector.
    Css(String),

    /// A JavaScript property path, e.g. `document.querySelector(...)`.
    JsPath(String),

    /// Composite locator carrying a display hint and/or a variable name.
    Guess(GuessSelector),
}

/// What an `XPath` encoding anchors on. Declaration order is resolution priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum XPathKind {
    ById,
    ByText,
    ByAttribute,
    Generic,
}

/// A guess locator.
///
/// The two halves serve different consumers: the hint is for display and
/// the variable is a reference to a runtime value. Neither is derived from
/// the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuessSelector {
    pub hint: Option<String>,
    pub variable: Option<String>,
}

/// An encoding that could not be parsed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MalformedSelector {
    pub tag: String,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for MalformedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} selector {:?}: {}", self.tag, self.value, self.reason)
    }
}

/// The element a step acts on: every encoding that parsed, plus the ones that didn't.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub encodings: Vec<SelectorEncoding>,
    pub malformed: Vec<MalformedSelector>,
}

impl Target {
    /// Parse wire selectors, splitting usable encodings from malformed ones.
    pub(crate) fn from_records(records: Vec<SelectorRecord>) -> Self {
        let mut target = Self::default();
        for record in records {
            match SelectorEncoding::parse(&record.tag, record.value.as_deref()) {
                Ok(encoding) => target.encodings.push(encoding),
                Err(reason) => target.malformed.push(MalformedSelector {
                    tag: record.tag,
                    value: record.value.unwrap_or_default(),
                    reason,
                }),
            }
        }
        target
    }

    /// Variable names embedded in guess encodings, in encoding order.
    pub fn guess_variables(&self) -> impl Iterator<Item = &str> {
        self.encodings.iter().filter_map(|e| match e {
            SelectorEncoding::Guess(GuessSelector {
                variable: Some(v), ..
            }) => Some(v.as_str()),
            _ => None,
        })
    }
}

/// A selector as it appears on the wire: a type tag and a string value.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SelectorRecord {
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(default, deserialize_with = "super::scalar::optional")]
    value: Option<String>,
}

#[cfg(test)]
impl SelectorRecord {
    pub(crate) fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: Some(value.into()),
        }
    }
}

/// The embedded payload of a `GUESS` selector.
#[derive(Deserialize)]
struct GuessPayload {
    #[serde(default, deserialize_with = "super::scalar::optional")]
    clue: Option<String>,
    #[serde(default, deserialize_with = "super::scalar::optional")]
    variable: Option<String>,
}

impl SelectorEncoding {
    /// Parse one wire selector.
    ///
    /// Returns the reason on failure; the caller records it and moves on.
    fn parse(tag: &str, value: Option<&str>) -> Result<Self, String> {
        let tag = tag.trim().to_ascii_uppercase();
        let value = value.map(str::trim).unwrap_or_default();

        if tag == "GUESS" {
            return parse_guess(value);
        }
        if value.is_empty() {
            return Err("empty value".to_string());
        }
        let value = value.to_string();
        let encoding = match tag.as_str() {
            "HINT" => Self::Hint(value),
            "TEXT" => Self::Text(value),
            "ID" => Self::Id(value),
            "XPATH_ID" => Self::XPath {
                kind: XPathKind::ById,
                expression: value,
            },
            "XPATH_TEXT" => Self::XPath {
                kind: XPathKind::ByText,
                expression: value,
            },
            "XPATH_ATTRIBUTES" | "XPATH_ATTRIBUTE" => Self::XPath {
                kind: XPathKind::ByAttribute,
                expression: value,
            },
            "XPATH" => Self::XPath {
                kind: XPathKind::Generic,
                expression: value,
            },
            "CSS_SELECTOR" | "CSS" => Self::Css(value),
            "JS_PATH" => Self::JsPath(value),
            other => return Err(format!("unknown selector type {other}")),
        };
        Ok(encoding)
    }
}

fn parse_guess(value: &str) -> Result<SelectorEncoding, String> {
    if value.is_empty() {
        return Err("empty guess payload".to_string());
    }
    let payload: GuessPayload =
        serde_json::from_str(value).map_err(|e| format!("invalid guess payload: {e}"))?;
    let hint = payload.clue.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    let variable = payload
        .variable
        .map(|v| super::bare_variable_name(&v).to_string())
        .filter(|v| !v.is_empty());
    if hint.is_none() && variable.is_none() {
        return Err("guess carries neither clue nor variable".to_string());
    }
    Ok(SelectorEncoding::Guess(GuessSelector { hint, variable }))
}
