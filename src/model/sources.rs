//! Records that bind variable values at run time, plus optional enrichment.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::scalar;

/// One execution of a journey: the test data bound for this run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// Per-variable initial data, keyed by variable name.
    #[serde(default, deserialize_with = "scalar::table")]
    pub initial_data: BTreeMap<String, String>,

    /// Sibling records of the data table this execution drew from.
    #[serde(default, deserialize_with = "scalar::rows")]
    pub test_data_rows: Vec<BTreeMap<String, String>>,
}

/// Environment configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub variables: Vec<EnvironmentVariable>,
}

/// An environment variable.
///
/// `key` is the storage identifier and is usually opaque; lookups match
/// on `name`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EnvironmentVariable {
    #[serde(default, deserialize_with = "scalar::optional")]
    pub key: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub value: Option<String>,
}

impl Environment {
    /// The first non-empty value declared under `name`.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        let variable = self
            .variables
            .iter()
            .filter(|v| v.name == name)
            .find(|v| v.value.as_deref().is_some_and(|s| !s.is_empty()))?;
        tracing::trace!(name, key = ?variable.key, "matched environment variable");
        variable.value.as_deref()
    }
}

/// API definitions keyed by id, used to name positional call inputs.
pub type ApiCatalog = BTreeMap<String, ApiDefinition>;

/// What is known about an API beyond its id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiDefinition {
    #[serde(default, deserialize_with = "scalar::optional")]
    pub name: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}
