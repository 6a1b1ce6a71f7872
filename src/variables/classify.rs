//! Variable type classification.
//!
//! A priority-ordered decision list over the evidence one run has: how the
//! variable was used, its name, its resolved value, and its sibling values
//! in the data table. Nothing here is remembered between runs; the same
//! name can mean different things in different journeys.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Classification, Constraint, Format, VariableUsage};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").expect("valid url pattern"));
static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?\d+$").expect("valid integer pattern"));
static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?\d*\.\d+$").expect("valid decimal pattern"));
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4})$").expect("valid date pattern")
});
static BOOLEAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:true|false|yes|no)$").expect("valid boolean pattern"));
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid identifier pattern"));

const CREDENTIAL_WORDS: &[&str] = &[
    "password",
    "passwd",
    "passphrase",
    "pwd",
    "secret",
    "token",
    "apikey",
    "credential",
    "credentials",
    "pin",
];

/// Second words that make a preceding word a credential: `api_key`, `secretKey`.
const CREDENTIAL_PAIRS: &[(&str, &str)] = &[
    ("api", "key"),
    ("private", "key"),
    ("access", "key"),
    ("secret", "key"),
];

const IDENTIFIER_WORDS: &[&str] = &[
    "username",
    "user",
    "login",
    "userid",
    "id",
    "identifier",
    "handle",
    "account",
    "uid",
];

/// Classify one resolved variable.
///
/// `rows` are the sibling records of the data table the value came from.
pub fn classify(
    usage: &VariableUsage,
    value: &str,
    rows: &[BTreeMap<String, String>],
) -> Classification {
    let tokens = name_tokens(&usage.name);

    if usage.selector_only() {
        return element_selector(value);
    }
    if is_credential(&tokens) {
        return credential(value);
    }

    let observed = observed_values(&usage.name, value, rows);
    if observed.len() > 1 {
        return enumeration(observed);
    }

    if let Some(classification) = from_value_shape(value) {
        return classification;
    }
    if tokens.iter().any(|t| IDENTIFIER_WORDS.contains(&t.as_str())) && IDENTIFIER.is_match(value)
    {
        return Classification {
            format: Format::Alphanumeric,
            constraint: Constraint::PatternMatch,
            examples: examples(value, &["jdoe", "user_01"]),
            invalid_examples: strings(&["jdoe@example.com", "has spaces"]),
            rule: "letters, digits, '.', '_' or '-' only; not an email address".to_string(),
        };
    }

    Classification {
        format: Format::Text,
        constraint: Constraint::FreeText,
        examples: examples(value, &["Sample text", "Another value"]),
        invalid_examples: strings(&[""]),
        rule: "any non-empty text".to_string(),
    }
}

fn element_selector(value: &str) -> Classification {
    let value = if value == super::SELECTOR_PLACEHOLDER {
        ""
    } else {
        value
    };
    Classification {
        format: Format::Selector,
        constraint: Constraint::ElementSelector,
        examples: examples(
            value,
            &["#submit-button", ".btn-primary", "[data-test=\"login\"]", "//button[@id='submit']"],
        ),
        invalid_examples: strings(&["submit", "42"]),
        rule: "a CSS selector, XPath expression, or element id that locates one element"
            .to_string(),
    }
}

fn credential(value: &str) -> Classification {
    let min_len = value.chars().count().clamp(8, 64);
    let examples = ["S3cure!Passw0rd", "c0rrect-H0rse-Battery", "Zx9#qLm2$vTw"]
        .into_iter()
        .filter(|e| *e != value)
        .take(2)
        .map(String::from)
        .collect();
    Classification {
        format: Format::Secret,
        constraint: Constraint::Credential,
        examples,
        invalid_examples: ["", "password", "12345"]
            .into_iter()
            .filter(|e| *e != value)
            .map(String::from)
            .collect(),
        rule: format!(
            "at least {min_len} characters mixing letters, digits and symbols; never shown in output"
        ),
    }
}

fn enumeration(observed: Vec<String>) -> Classification {
    let invalid = (1..)
        .map(|n| format!("unlisted value {n}"))
        .find(|candidate| !observed.contains(candidate))
        .unwrap_or_default();
    Classification {
        format: Format::Enumeration,
        constraint: Constraint::FixedEnumeration,
        rule: format!("one of: {}", observed.join(", ")),
        examples: observed,
        invalid_examples: vec![String::new(), invalid],
    }
}

/// Classification from the value alone, when its shape is recognizable.
fn from_value_shape(value: &str) -> Option<Classification> {
    let value = value.trim();
    let pattern = |format, defaults: &[&str], invalid: &[&str], rule: &str| Classification {
        format,
        constraint: Constraint::PatternMatch,
        examples: examples(value, defaults),
        invalid_examples: strings(invalid),
        rule: rule.to_string(),
    };

    let classification = if EMAIL.is_match(value) {
        pattern(
            Format::Email,
            &["user@example.com", "first.last@example.org"],
            &["user@", "example.com", "plain text"],
            "an email address: local part, '@', and a domain containing a dot",
        )
    } else if URL.is_match(value) {
        pattern(
            Format::Url,
            &["https://example.com", "https://example.com/path?q=1"],
            &["example", "ftp//missing-colon"],
            "an absolute http or https URL",
        )
    } else if INTEGER.is_match(value) {
        pattern(
            Format::Integer,
            &["0", "42"],
            &["4.2", "abc"],
            "a whole number",
        )
    } else if DECIMAL.is_match(value) {
        pattern(
            Format::Decimal,
            &["0.5", "19.99"],
            &["1.2.3", "abc"],
            "a decimal number",
        )
    } else if DATE.is_match(value) {
        pattern(
            Format::Date,
            &["2024-01-31", "12/31/2024"],
            &["tomorrow", "31st of never"],
            "a calendar date, YYYY-MM-DD or M/D/YYYY",
        )
    } else if BOOLEAN.is_match(value) {
        pattern(
            Format::Boolean,
            &["true", "false"],
            &["maybe", "2"],
            "true, false, yes or no, in any letter case",
        )
    } else {
        return None;
    };
    Some(classification)
}

/// Distinct non-empty values for `name`: the resolved value, then each row's.
fn observed_values(name: &str, value: &str, rows: &[BTreeMap<String, String>]) -> Vec<String> {
    let mut observed: Vec<String> = Vec::new();
    let candidates = std::iter::once(value).chain(
        rows.iter()
            .filter_map(|row| row.get(name).map(String::as_str)),
    );
    for candidate in candidates {
        let candidate = candidate.trim();
        if !candidate.is_empty() && !observed.iter().any(|o| o == candidate) {
            observed.push(candidate.to_string());
        }
    }
    observed
}

/// Lowercased words of a variable name, split on separators and camelCase.
fn name_tokens(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for part in name.split(|c: char| !c.is_alphanumeric()) {
        let mut current = String::new();
        let mut prev_lower = false;
        for c in part.chars() {
            if c.is_uppercase() && prev_lower && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
            current.extend(c.to_lowercase());
        }
        if !current.is_empty() {
            tokens.push(current);
        }
    }
    tokens
}

fn is_credential(tokens: &[String]) -> bool {
    if tokens.len() == 1 && tokens[0] == "key" {
        return true;
    }
    tokens
        .iter()
        .any(|t| CREDENTIAL_WORDS.contains(&t.as_str()) || t.contains("password"))
        || tokens.windows(2).any(|pair| {
            CREDENTIAL_PAIRS
                .iter()
                .any(|(a, b)| pair[0] == *a && pair[1] == *b)
        })
}

/// The value first, then defaults that differ from it, three at most.
fn examples(value: &str, defaults: &[&str]) -> Vec<String> {
    let value = value.trim();
    std::iter::once(value)
        .filter(|v| !v.is_empty())
        .chain(defaults.iter().copied().filter(|d| *d != value))
        .take(3)
        .map(String::from)
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
