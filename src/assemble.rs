//! Checkpoint assembly: number checkpoints and lay out the text document.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Assigns display numbers to checkpoint titles.
///
/// A repeated title gets the number it was first given. New titles get
/// one more than the highest number so far.
#[derive(Debug, Default)]
pub struct CheckpointNumbers {
    assigned: BTreeMap<String, usize>,
    highest: usize,
}

impl CheckpointNumbers {
    pub fn number(&mut self, title: &str) -> usize {
        if let Some(&n) = self.assigned.get(title) {
            return n;
        }
        self.highest += 1;
        self.assigned.insert(title.to_string(), self.highest);
        self.highest
    }
}

/// One checkpoint's converted lines under its header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Section {
    pub number: usize,
    pub title: String,
    pub lines: Vec<String>,
}

/// The rendered text document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Document {
    pub sections: Vec<Section>,
}

impl Document {
    /// Build the document from `(title, lines)` pairs in journey order.
    pub fn assemble<I, T>(checkpoints: I) -> Self
    where
        I: IntoIterator<Item = (T, Vec<String>)>,
        T: Into<String>,
    {
        let mut numbers = CheckpointNumbers::default();
        let sections = checkpoints
            .into_iter()
            .map(|(title, lines)| {
                let title = title.into();
                Section {
                    number: numbers.number(&title),
                    title,
                    lines,
                }
            })
            .collect();
        Self { sections }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "Checkpoint {}: {}", section.number, section.title)?;
            for line in &section.lines {
                writeln!(f, "{line}")?;
            }
        }
        Ok(())
    }
}
