//! One conversion run: journey in, document, variable report and diagnostics out.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::assemble::Document;
use crate::convert::Converter;
use crate::knowledge::KnowledgeStore;
use crate::model::{ApiCatalog, Diagnostic, Environment, Execution, Journey, VariableReport};
use crate::selector::{self, DEFAULT_MAX_TEXT_LEN};
use crate::variables::{self, Sources};

/// Run-time records that accompany a journey. All optional.
#[derive(Debug, Clone, Default)]
pub struct RunData {
    pub execution: Execution,
    pub environment: Environment,
    pub api_catalog: ApiCatalog,
}

/// Tunables for a run.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Visible-text selectors longer than this are skipped.
    pub max_text_len: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_text_len: DEFAULT_MAX_TEXT_LEN,
        }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Output {
    pub document: Document,
    pub variables: VariableReport,
    pub diagnostics: Vec<Diagnostic>,
}

impl Output {
    /// SHA-256 over the rendered document and the serialized report.
    ///
    /// Identical inputs and knowledge give identical fingerprints.
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(self.document.to_string().as_bytes());
        hasher.update(serde_json::to_vec(&self.variables)?);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Convert one journey.
///
/// Updates only the in-memory counters of `knowledge`; the caller saves it
/// once the run is complete.
pub fn convert(
    journey: &Journey,
    data: &RunData,
    options: &Options,
    knowledge: &mut KnowledgeStore,
) -> Output {
    let mut converter = Converter::new(knowledge, &data.api_catalog);
    let sections: Vec<(&str, Vec<String>)> = journey
        .cases
        .iter()
        .enumerate()
        .map(|(c, checkpoint)| {
            let lines = checkpoint
                .steps
                .iter()
                .enumerate()
                .map(|(s, step)| {
                    let resolution = step
                        .target
                        .as_ref()
                        .map(|t| selector::resolve(&t.encodings, options.max_text_len));
                    converter.convert(step, resolution.as_ref(), c + 1, s + 1)
                })
                .collect();
            (checkpoint.title.as_str(), lines)
        })
        .collect();
    let document = Document::assemble(sections);
    let mut diagnostics = converter.into_diagnostics();

    let sources = Sources {
        data_attributes: &journey.data_attributes,
        execution: &data.execution,
        environment: &data.environment,
    };
    let (variables, unresolved) = variables::report(journey, &sources);
    diagnostics.extend(unresolved);

    tracing::info!(
        title = journey.title.as_deref().unwrap_or_default(),
        checkpoints = document.sections.len(),
        variables = variables.len(),
        diagnostics = diagnostics.len(),
        "converted journey"
    );
    Output {
        document,
        variables,
        diagnostics,
    }
}
