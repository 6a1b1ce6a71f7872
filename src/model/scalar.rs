//! Lenient scalar decoding for wire fields.
//!
//! Test platforms emit numbers and booleans where strings are expected
//! (`"value": 42`, `"apiTestId": 1234`). These helpers accept any JSON
//! scalar and render it as a string; `null` and containers become `None`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Render a JSON scalar as a string.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Deserialize an optional scalar field, treating empty strings as absent.
pub(crate) fn optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty()))
}

/// Deserialize a flat name → scalar map.
///
/// `null` entries are kept as empty strings so the table still records
/// that the name was declared; lookups treat empty as not found.
pub(crate) fn table<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(k, v)| {
            let v = scalar_to_string(&v).unwrap_or_default();
            (k, v)
        })
        .collect())
}

/// Deserialize a list of name → scalar maps (rows of a data table).
pub(crate) fn rows<'de, D>(deserializer: D) -> Result<Vec<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<BTreeMap<String, Value>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(k, v)| (k, scalar_to_string(&v).unwrap_or_default()))
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "optional")]
        field: Option<String>,
        #[serde(default, deserialize_with = "table")]
        table: BTreeMap<String, String>,
    }

    #[test]
    fn numbers_and_bools_become_strings() {
        let probe: Probe = serde_json::from_value(json!({ "field": 42 })).unwrap();
        assert_eq!(probe.field.as_deref(), Some("42"));

        let probe: Probe = serde_json::from_value(json!({ "field": true })).unwrap();
        assert_eq!(probe.field.as_deref(), Some("true"));
    }

    #[test]
    fn empty_and_null_are_absent() {
        let probe: Probe = serde_json::from_value(json!({ "field": "" })).unwrap();
        assert!(probe.field.is_none());

        let probe: Probe = serde_json::from_value(json!({ "field": null })).unwrap();
        assert!(probe.field.is_none());

        let probe: Probe = serde_json::from_value(json!({})).unwrap();
        assert!(probe.field.is_none());
    }

    #[test]
    fn table_keeps_null_entries_as_empty() {
        let probe: Probe =
            serde_json::from_value(json!({ "table": { "a": "x", "b": null, "c": 7 } })).unwrap();
        assert_eq!(probe.table["a"], "x");
        assert_eq!(probe.table["b"], "");
        assert_eq!(probe.table["c"], "7");
    }
}
