//! Journeys and checkpoints.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::scalar;
use super::step::Step;

/// A complete test definition: ordered checkpoints plus data attributes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    #[serde(default, deserialize_with = "scalar::optional")]
    pub title: Option<String>,

    #[serde(alias = "checkpoints")]
    pub cases: Vec<Checkpoint>,

    /// Variable name → literal. Empty entries are declared but unset.
    #[serde(default, deserialize_with = "scalar::table")]
    pub data_attributes: BTreeMap<String, String>,
}

/// A named, ordered group of steps.
///
/// Titles are not unique: a shared checkpoint may appear more than once.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Checkpoint {
    #[serde(alias = "name", default)]
    pub title: String,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Journey {
    /// All steps with their 1-based checkpoint and step positions.
    pub fn steps(&self) -> impl Iterator<Item = (usize, usize, &Step)> {
        self.cases.iter().enumerate().flat_map(|(c, checkpoint)| {
            checkpoint
                .steps
                .iter()
                .enumerate()
                .map(move |(s, step)| (c + 1, s + 1, step))
        })
    }
}
