//! Variable value resolution across the run's data sources.

use std::collections::BTreeMap;

use crate::model::{
    Action, EnvironmentKind, Environment, Execution, Journey, SourceCategory, VariableUsage,
    bare_variable_name, variable_reference,
};

/// Stands in for the value of a variable that only locates an element.
pub const SELECTOR_PLACEHOLDER: &str = "[element selector]";

/// The data sources a run resolves variables from.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub data_attributes: &'a BTreeMap<String, String>,
    pub execution: &'a Execution,
    pub environment: &'a Environment,
}

/// The outcome of resolving one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Value {
        value: String,
        source: SourceCategory,
    },

    /// No value anywhere, but the variable only locates an element.
    Placeholder,

    Unresolved,
}

/// Values the journey assigns itself: literal `STORE`s and environment `SET`/`ADD`s.
///
/// The first non-empty assignment of each name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalValues(BTreeMap<String, String>);

impl LocalValues {
    pub fn from_journey(journey: &Journey) -> Self {
        let mut values = BTreeMap::new();
        for (_, _, step) in journey.steps() {
            let name = match &step.action {
                Action::Store => step.variable.as_deref(),
                Action::Environment(meta)
                    if matches!(meta.kind, Some(EnvironmentKind::Set | EnvironmentKind::Add)) =>
                {
                    meta.name
                        .as_deref()
                        .map(bare_variable_name)
                        .or(step.variable.as_deref())
                }
                _ => None,
            };
            let value = step
                .value
                .as_deref()
                .filter(|v| !v.trim().is_empty() && variable_reference(v).is_none());
            if let (Some(name), Some(value)) = (name, value) {
                values
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

/// Resolve one used variable. First non-empty source wins:
/// data attributes, initial data, environment (by name), local assignments.
pub fn resolve(usage: &VariableUsage, sources: &Sources<'_>, locals: &LocalValues) -> Resolved {
    let name = usage.name.as_str();
    let found = non_empty(sources.data_attributes.get(name))
        .map(|v| (v, SourceCategory::TestData))
        .or_else(|| {
            non_empty(sources.execution.initial_data.get(name))
                .map(|v| (v, SourceCategory::TestData))
        })
        .or_else(|| {
            sources
                .environment
                .value_of(name)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (v, SourceCategory::Environment))
        })
        .or_else(|| locals.get(name).map(|v| (v, SourceCategory::Local)));

    match found {
        Some((value, source)) => Resolved::Value {
            value: value.to_string(),
            source,
        },
        None if usage.selector_only() => Resolved::Placeholder,
        None => Resolved::Unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::model::{UsageContext, VariableReference};

    fn usage(name: &str, context: UsageContext) -> VariableUsage {
        VariableUsage {
            name: name.to_string(),
            references: vec![VariableReference {
                checkpoint: 1,
                step: 1,
                action: "WRITE".to_string(),
                context,
            }],
        }
    }

    struct Fixture {
        data: BTreeMap<String, String>,
        execution: Execution,
        environment: Environment,
    }

    impl Fixture {
        fn new() -> Self {
            let mut data = BTreeMap::new();
            data.insert("username".to_string(), "admin".to_string());
            data.insert("password".to_string(), String::new());
            data.insert("city".to_string(), "  ".to_string());

            let mut execution = Execution::default();
            execution
                .initial_data
                .insert("password".to_string(), "hunter2".to_string());
            execution
                .initial_data
                .insert("username".to_string(), "ignored".to_string());

            let environment: Environment = serde_json::from_value(json!({
                "variables": [
                    { "key": "signaturebox", "name": "decoy", "value": "wrong" },
                    { "key": "a81f", "name": "signaturebox", "value": "/html/body/div[3]/canvas" }
                ]
            }))
            .unwrap();
            Self {
                data,
                execution,
                environment,
            }
        }

        fn sources(&self) -> Sources<'_> {
            Sources {
                data_attributes: &self.data,
                execution: &self.execution,
                environment: &self.environment,
            }
        }
    }

    #[test]
    fn data_attributes_win_over_initial_data() {
        let f = Fixture::new();
        let resolved = resolve(&usage("username", UsageContext::Slot), &f.sources(), &LocalValues::default());
        assert_eq!(
            resolved,
            Resolved::Value {
                value: "admin".to_string(),
                source: SourceCategory::TestData
            }
        );
    }

    #[test]
    fn empty_data_attribute_falls_through() {
        let f = Fixture::new();
        let resolved = resolve(&usage("password", UsageContext::Slot), &f.sources(), &LocalValues::default());
        assert_eq!(
            resolved,
            Resolved::Value {
                value: "hunter2".to_string(),
                source: SourceCategory::TestData
            }
        );
    }

    #[test]
    fn environment_matches_by_name() {
        let f = Fixture::new();
        let resolved = resolve(
            &usage("signaturebox", UsageContext::GuessSelector),
            &f.sources(),
            &LocalValues::default(),
        );
        assert_eq!(
            resolved,
            Resolved::Value {
                value: "/html/body/div[3]/canvas".to_string(),
                source: SourceCategory::Environment
            }
        );
    }

    #[test]
    fn whitespace_only_is_empty() {
        let f = Fixture::new();
        let resolved = resolve(&usage("city", UsageContext::Slot), &f.sources(), &LocalValues::default());
        assert_eq!(resolved, Resolved::Unresolved);
    }

    #[test]
    fn selector_only_gets_placeholder() {
        let f = Fixture::new();
        let resolved = resolve(
            &usage("missingbox", UsageContext::GuessSelector),
            &f.sources(),
            &LocalValues::default(),
        );
        assert_eq!(resolved, Resolved::Placeholder);
    }

    #[test]
    fn local_assignments_resolve_last() {
        let journey: Journey = serde_json::from_value(json!({
            "cases": [ { "title": "One", "steps": [
                { "action": "STORE", "variable": "total", "value": "42" },
                { "action": "STORE", "variable": "total", "value": "43" },
                { "action": "STORE", "variable": "copy", "value": "$total" },
                { "action": "ENVIRONMENT", "value": "blue", "meta": { "type": "SET", "name": "$theme" } },
                { "action": "ENVIRONMENT", "meta": { "type": "DELETE", "name": "gone" }, "value": "x" }
            ] } ]
        }))
        .unwrap();
        let locals = LocalValues::from_journey(&journey);
        assert_eq!(locals.get("total"), Some("42"));
        assert_eq!(locals.get("theme"), Some("blue"));
        assert_eq!(locals.get("copy"), None);
        assert_eq!(locals.get("gone"), None);

        let f = Fixture::new();
        let resolved = resolve(&usage("total", UsageContext::Slot), &f.sources(), &locals);
        assert_eq!(
            resolved,
            Resolved::Value {
                value: "42".to_string(),
                source: SourceCategory::Local
            }
        );
    }
}
