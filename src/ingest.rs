//! Loading journeys and their run-time records from disk.
//!
//! A journey file is either a journey record or a raw extraction bundle
//! (`{"extracted_data": {...}}`) as saved by the platform extractor. Bundles
//! are structured into a journey by taking the first usable endpoint in
//! [`SOURCE_PRIORITY`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::model::{ApiCatalog, Environment, Execution, Journey};

/// Extraction endpoints, most useful first.
pub const SOURCE_PRIORITY: &[&str] = &[
    "checkpoints",
    "steps",
    "journey_steps",
    "testsuite",
    "execution_journey",
    "graphql",
];

/// Title given to a checkpoint synthesized around a flat step list.
pub const FLAT_STEPS_TITLE: &str = "Execution Steps";

/// Errors structuring an extraction bundle.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("extraction bundle has no checkpoint or step data")]
    NoCheckpointData,

    #[error("`{endpoint}` data is not a journey: {source}")]
    Invalid {
        endpoint: &'static str,
        source: serde_json::Error,
    },
}

/// Errors loading an input file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot use {}: {source}", path.display())]
    Ingest { path: PathBuf, source: IngestError },
}

/// Load a journey file, structuring it first if it is an extraction bundle.
pub fn load_journey(path: &Path) -> Result<Journey, LoadError> {
    let value: Value = read_json(path)?;
    if value.get("extracted_data").is_some() {
        tracing::debug!(path = %path.display(), "structuring extraction bundle");
        return structure(&value).map_err(|source| LoadError::Ingest {
            path: path.to_path_buf(),
            source,
        });
    }
    serde_json::from_value(value).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_execution(path: &Path) -> Result<Execution, LoadError> {
    read_json(path)
}

pub fn load_environment(path: &Path) -> Result<Environment, LoadError> {
    read_json(path)
}

pub fn load_api_catalog(path: &Path) -> Result<ApiCatalog, LoadError> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&contents).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_value(unwrap_item(value)).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// API responses wrap the record in `{"item": ...}`.
fn unwrap_item(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("item") => {
            map.remove("item").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Structure an extraction bundle into a journey.
pub fn structure(bundle: &Value) -> Result<Journey, IngestError> {
    let extracted = bundle
        .get("extracted_data")
        .and_then(Value::as_object)
        .ok_or(IngestError::NoCheckpointData)?;

    for &endpoint in SOURCE_PRIORITY {
        let Some(data) = extracted.get(endpoint).filter(|d| !is_empty(d)) else {
            continue;
        };
        let data = unwrap_item(data.clone());
        let journey = match endpoint {
            "checkpoints" => Some(json!({ "cases": as_list(data) })),
            "steps" | "journey_steps" => Some(json!({
                "cases": [ { "title": FLAT_STEPS_TITLE, "steps": as_list(data) } ]
            })),
            "testsuite" | "execution_journey" => journey_payload(data),
            _ => graphql_payload(&data),
        };
        let Some(journey) = journey else {
            tracing::debug!(endpoint, "endpoint has no usable checkpoints");
            continue;
        };
        let journey: Journey = serde_json::from_value(journey)
            .map_err(|source| IngestError::Invalid { endpoint, source })?;
        if journey.cases.is_empty() {
            continue;
        }
        tracing::info!(endpoint, checkpoints = journey.cases.len(), "structured bundle");
        return Ok(journey);
    }
    Err(IngestError::NoCheckpointData)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn as_list(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        other => Value::Array(vec![other]),
    }
}

/// A test suite or journey payload: a journey record under another name.
fn journey_payload(data: Value) -> Option<Value> {
    let has_cases = data
        .get("cases")
        .or_else(|| data.get("checkpoints"))
        .is_some_and(|c| !is_empty(c));
    has_cases.then_some(data)
}

/// `data.execution.journey.checkpoints`, with plain selector strings lifted to hints.
fn graphql_payload(data: &Value) -> Option<Value> {
    let checkpoints = data
        .pointer("/data/execution/journey/checkpoints")?
        .as_array()?;
    let cases: Vec<Value> = checkpoints
        .iter()
        .map(|checkpoint| {
            let mut checkpoint = checkpoint.clone();
            if let Some(steps) = checkpoint.get_mut("steps").and_then(Value::as_array_mut) {
                for step in steps.iter_mut().filter_map(Value::as_object_mut) {
                    lift_selector(step);
                }
            }
            checkpoint
        })
        .collect();
    Some(json!({ "cases": cases }))
}

fn lift_selector(step: &mut Map<String, Value>) {
    if step.contains_key("element") {
        return;
    }
    let Some(Value::String(selector)) = step.remove("selector") else {
        return;
    };
    if selector.trim().is_empty() {
        return;
    }
    step.insert(
        "element".to_string(),
        json!({ "target": { "selectors": [ { "type": "HINT", "value": selector } ] } }),
    );
}
