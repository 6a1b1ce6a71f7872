//! Selector resolution: pick one display string for a step's target.
//!
//! Priority is fixed and independent of input order:
//!
//! 1. `hint` (or a guess encoding's hint)
//! 2. `text`, only when at most `max_text_len` characters
//! 3. `id`
//! 4. `XPath` by id, by text, by attribute, then generic
//! 5. `css`
//! 6. `js-path`
//!
//! A guess encoding's variable half is never used here.

use std::fmt;

use crate::model::{GuessSelector, SelectorEncoding, XPathKind};

/// Visible text longer than this is skipped rather than truncated.
pub const DEFAULT_MAX_TEXT_LEN: usize = 100;

/// The outcome of resolving a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The canonical display string.
    Selector(String),

    /// Nothing usable: the list was empty or every variant was unusable.
    NoSelector,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(s) => f.write_str(s),
            Self::NoSelector => f.write_str("NO_SELECTOR"),
        }
    }
}

/// Resolve an ordered list of encodings to one display string.
pub fn resolve(encodings: &[SelectorEncoding], max_text_len: usize) -> Resolution {
    encodings
        .iter()
        .filter_map(|e| rank(e, max_text_len).map(|rank| (rank, e)))
        // First in input order wins among equal ranks.
        .min_by_key(|(rank, _)| *rank)
        .and_then(|(_, e)| display(e))
        .map_or(Resolution::NoSelector, Resolution::Selector)
}

/// Priority rank of an encoding, lower is better. `None` when unusable.
fn rank(encoding: &SelectorEncoding, max_text_len: usize) -> Option<u8> {
    let rank = match encoding {
        SelectorEncoding::Hint(_) | SelectorEncoding::Guess(GuessSelector { hint: Some(_), .. }) => 0,
        SelectorEncoding::Text(text) if text.chars().count() <= max_text_len => 1,
        SelectorEncoding::Text(_) | SelectorEncoding::Guess(_) => return None,
        SelectorEncoding::Id(_) => 2,
        SelectorEncoding::XPath { kind, .. } => match kind {
            XPathKind::ById => 3,
            XPathKind::ByText => 4,
            XPathKind::ByAttribute => 5,
            XPathKind::Generic => 6,
        },
        SelectorEncoding::Css(_) => 7,
        SelectorEncoding::JsPath(_) => 8,
    };
    Some(rank)
}

fn display(encoding: &SelectorEncoding) -> Option<String> {
    match encoding {
        SelectorEncoding::Hint(s)
        | SelectorEncoding::Text(s)
        | SelectorEncoding::Id(s)
        | SelectorEncoding::Css(s)
        | SelectorEncoding::JsPath(s)
        | SelectorEncoding::XPath { expression: s, .. } => Some(s.clone()),
        SelectorEncoding::Guess(guess) => guess.hint.clone(),
    }
}
