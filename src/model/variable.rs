//! Variable usage, resolution records, and the variable report.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Where a variable reference was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageContext {
    /// The step's own variable slot.
    Slot,

    /// Embedded in a guess selector, i.e. used to locate an element.
    GuessSelector,

    /// Bound as an input or operand (API call inputs, variable comparisons).
    Binding,
}

/// One place a variable is referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VariableReference {
    pub checkpoint: usize,
    pub step: usize,
    pub action: String,
    pub context: UsageContext,
}

/// Every reference to one variable name, in the order found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableUsage {
    pub name: String,
    pub references: Vec<VariableReference>,
}

impl VariableUsage {
    /// True when every reference is a guess-selector locator.
    pub fn selector_only(&self) -> bool {
        self.references
            .iter()
            .all(|r| r.context == UsageContext::GuessSelector)
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceCategory {
    TestData,
    Environment,
    Local,
}

/// The constraint a variable's values must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Constraint {
    FreeText,
    FixedEnumeration,
    PatternMatch,
    ElementSelector,
    Credential,
}

/// The inferred value format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    Text,
    Enumeration,
    Email,
    Url,
    Integer,
    Decimal,
    Date,
    Boolean,
    Alphanumeric,
    Selector,
    Secret,
}

/// What was inferred about a variable's expected data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Classification {
    pub format: Format,
    pub constraint: Constraint,
    pub examples: Vec<String>,
    pub invalid_examples: Vec<String>,
    pub rule: String,
}

/// A variable that is both used and resolved to a non-empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VariableRecord {
    #[serde(skip)]
    pub name: String,
    pub value: String,
    pub source: SourceCategory,
    pub classification: Classification,
    pub usages: Vec<VariableReference>,
}

/// The variable report, in first-seen order.
///
/// Serializes as a map keyed by `$name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableReport {
    pub records: Vec<VariableRecord>,
}

impl VariableReport {
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&VariableRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl Serialize for VariableReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&format!("${}", record.name), record)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(context: UsageContext) -> VariableReference {
        VariableReference {
            checkpoint: 1,
            step: 1,
            action: "WRITE".into(),
            context,
        }
    }

    #[test]
    fn selector_only_requires_every_reference() {
        let mut usage = VariableUsage {
            name: "signaturebox".into(),
            references: vec![reference(UsageContext::GuessSelector)],
        };
        assert!(usage.selector_only());

        usage.references.push(reference(UsageContext::Slot));
        assert!(!usage.selector_only());
    }

    #[test]
    fn report_serializes_with_marker_keys_in_order() {
        let classification = Classification {
            format: Format::Alphanumeric,
            constraint: Constraint::PatternMatch,
            examples: vec!["admin".into(), "user123".into()],
            invalid_examples: vec!["user name".into()],
            rule: "letters and digits".into(),
        };
        let record = |name: &str| VariableRecord {
            name: name.into(),
            value: "admin".into(),
            source: SourceCategory::TestData,
            classification: classification.clone(),
            usages: vec![reference(UsageContext::Slot)],
        };
        let report = VariableReport {
            records: vec![record("zeta"), record("alpha")],
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.find("\"$zeta\"").unwrap() < json.find("\"$alpha\"").unwrap());
        assert!(json.contains("\"source\":\"test-data\""));
        assert!(json.contains("\"constraint\":\"pattern-match\""));
        assert!(json.contains("\"invalid-examples\""));
        assert!(!json.contains("\"name\""));
    }
}
