//! Variable usage scanning.

use std::collections::BTreeMap;

use crate::model::{
    Action, Assertion, Journey, Step, UsageContext, VariableReference, VariableUsage,
    bare_variable_name, variable_reference,
};

/// Every variable the journey's steps reference, grouped by name in first-seen order.
///
/// Guess-embedded names count whether or not the journey declares them
/// as data attributes. Data attributes no step references are not included.
pub fn scan(journey: &Journey) -> Vec<VariableUsage> {
    let mut usages: Vec<VariableUsage> = Vec::new();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();

    for (checkpoint, step_number, step) in journey.steps() {
        for (name, context) in references(step) {
            let reference = VariableReference {
                checkpoint,
                step: step_number,
                action: step.action.kind().to_string(),
                context,
            };
            if let Some(&i) = index.get(&name) {
                usages[i].references.push(reference);
            } else {
                index.insert(name.clone(), usages.len());
                usages.push(VariableUsage {
                    name,
                    references: vec![reference],
                });
            }
        }
    }
    tracing::debug!(variables = usages.len(), "scanned variable usage");
    usages
}

/// The names one step references, in slot, selector, binding order.
fn references(step: &Step) -> Vec<(String, UsageContext)> {
    let mut found = Vec::new();

    if let Some(name) = &step.variable {
        found.push((name.clone(), UsageContext::Slot));
    }
    if let Some(target) = &step.target {
        found.extend(
            target
                .guess_variables()
                .map(bare_variable_name)
                .filter(|n| !n.is_empty())
                .map(|n| (n.to_string(), UsageContext::GuessSelector)),
        );
    }

    let mut bind = |raw: &str| {
        let name = bare_variable_name(raw);
        if !name.is_empty() {
            found.push((name.to_string(), UsageContext::Binding));
        }
    };
    if let Some(name) = step.value.as_deref().and_then(variable_reference) {
        bind(name);
    }
    match &step.action {
        Action::ApiCall(meta) => {
            if let Some(inputs) = &meta.input_variables {
                inputs.variables().into_iter().for_each(&mut bind);
            }
            if let Some(output) = &meta.output_variable {
                bind(output);
            }
        }
        Action::Assert(Assertion::Variable(comparison)) => {
            if let Some(operand) = &comparison.operand_variable {
                bind(operand);
            }
        }
        _ => {}
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn journey(steps: serde_json::Value) -> Journey {
        serde_json::from_value(json!({ "cases": [ { "title": "One", "steps": steps } ] })).unwrap()
    }

    fn names(usages: &[VariableUsage]) -> Vec<&str> {
        usages.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn groups_by_name_in_first_seen_order() {
        let j = journey(json!([
            { "action": "WRITE", "variable": "b" },
            { "action": "WRITE", "variable": "$a" },
            { "action": "ASSERT_EQUALS", "variable": "b" }
        ]));
        let usages = scan(&j);
        assert_eq!(names(&usages), vec!["b", "a"]);
        assert_eq!(usages[0].references.len(), 2);
        assert_eq!(usages[0].references[1].step, 3);
        assert_eq!(usages[0].references[1].action, "ASSERT_EQUALS");
    }

    #[test]
    fn guess_variable_is_captured_without_data_attribute() {
        let j = journey(json!([{
            "action": "CLICK",
            "element": { "target": { "selectors": [
                { "type": "GUESS", "value": "{\"clue\":\"\",\"variable\":\"signaturebox\"}" }
            ] } }
        }]));
        let usages = scan(&j);
        assert_eq!(names(&usages), vec!["signaturebox"]);
        assert!(usages[0].selector_only());
    }

    #[test]
    fn unreferenced_data_attributes_are_ignored() {
        let j: Journey = serde_json::from_value(json!({
            "cases": [ { "title": "One", "steps": [ { "action": "CLICK" } ] } ],
            "dataAttributes": { "QuestionType9": "" }
        }))
        .unwrap();
        assert!(scan(&j).is_empty());
    }

    #[test]
    fn bindings_count_as_usage() {
        let j = journey(json!([
            {
                "action": "API_CALL",
                "meta": { "inputVariables": { "user": "$login" }, "outputVariable": "response" }
            },
            {
                "action": "ASSERT_VARIABLE",
                "variable": "count",
                "meta": { "type": "EQUALS", "operandVariable": "expected" }
            },
            { "action": "WRITE", "value": "${suffix}" }
        ]));
        let usages = scan(&j);
        assert_eq!(
            names(&usages),
            vec!["login", "response", "count", "expected", "suffix"]
        );
        assert!(!usages[0].selector_only());
        assert_eq!(usages[0].references[0].context, UsageContext::Binding);
    }
}
