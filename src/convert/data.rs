//! Data handling: stored values, environment variables, API calls, scripts, comments.

use crate::model::{
    ApiCallMeta, ApiCatalog, EnvironmentKind, EnvironmentMeta, InputBindings, bare_variable_name,
};

use super::phrase::{View, quote};

pub(super) fn store(view: &View<'_>) -> String {
    let destination = view
        .variable()
        .unwrap_or_else(|| "a variable".to_string());
    match view.value() {
        Some(value) => format!("Store {value} in {destination}"),
        None => format!("Store the value of {} in {destination}", view.target_or_element()),
    }
}

pub(super) fn environment(meta: &EnvironmentMeta, view: &View<'_>) -> String {
    let name = meta
        .name
        .as_deref()
        .map(bare_variable_name)
        .filter(|n| !n.is_empty())
        .map(|n| format!(" ${n}"))
        .or_else(|| view.variable().map(|v| format!(" {v}")))
        .unwrap_or_default();
    let value = view.value();
    match (meta.kind, value) {
        (Some(EnvironmentKind::Set), Some(value)) => {
            format!("Set environment variable{name} to {value}")
        }
        (Some(EnvironmentKind::Set), None) => format!("Set environment variable{name}"),
        (Some(EnvironmentKind::Add), Some(value)) => {
            format!("Add environment variable{name} with value {value}")
        }
        (Some(EnvironmentKind::Add), None) => format!("Add environment variable{name}"),
        (Some(EnvironmentKind::Delete), _) => format!("Delete environment variable{name}"),
        (Some(EnvironmentKind::Other) | None, _) => format!("Update environment variable{name}"),
    }
}

pub(super) fn api_call(meta: &ApiCallMeta, view: &View<'_>, catalog: &ApiCatalog) -> String {
    let definition = meta.api_test_id.as_deref().and_then(|id| catalog.get(id));
    let label = definition
        .and_then(|d| d.name.as_deref())
        .or(meta.name.as_deref())
        .map(quote)
        .or_else(|| meta.api_test_id.clone());

    let mut line = match label {
        Some(label) => format!("Make API call {label}"),
        None => "Make API call".to_string(),
    };

    let parameters = definition.map(|d| d.parameters.as_slice()).unwrap_or_default();
    let inputs = meta
        .input_variables
        .as_ref()
        .map(|b| inputs(b, parameters))
        .unwrap_or_default();
    if !inputs.is_empty() {
        line.push_str(" with ");
        line.push_str(&inputs.join(", "));
    }

    let output = meta
        .output_variable
        .as_deref()
        .map(bare_variable_name)
        .filter(|n| !n.is_empty())
        .map(|n| format!("${n}"))
        .or_else(|| view.variable());
    if let Some(output) = output {
        line.push_str(&format!(" and store response in {output}"));
    }
    line
}

/// Input bindings as `param=$var`, naming positional inputs from the catalog when known.
fn inputs(bindings: &InputBindings, parameters: &[String]) -> Vec<String> {
    match bindings {
        InputBindings::Named(map) => map
            .iter()
            .map(|(param, var)| format!("{param}=${}", bare_variable_name(var)))
            .collect(),
        InputBindings::Positional(list) => list
            .iter()
            .map(|v| bare_variable_name(v))
            .filter(|v| !v.is_empty())
            .enumerate()
            .map(|(i, var)| match parameters.get(i) {
                Some(param) => format!("{param}=${var}"),
                None => format!("${var}"),
            })
            .collect(),
    }
}

pub(super) fn execute(view: &View<'_>) -> String {
    let mut line = match view.step.value.as_deref() {
        Some(script) => format!("Execute script {}", quote(script)),
        None => "Execute script".to_string(),
    };
    if let Some(result) = view.variable() {
        line.push_str(&format!(" and store result in {result}"));
    }
    line
}

pub(super) fn comment(view: &View<'_>) -> String {
    match view.step.value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => format!("Comment: {text}"),
        _ => "Comment".to_string(),
    }
}
