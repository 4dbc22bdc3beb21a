//! CV sections — the marker-delimited regions of the résumé that may be rewritten.
//!
//! Flow: SectionSpec (configuration) → extractor → ExtractedSections →
//!       (adaptation) → writer → adapted document.
//!
//! Matching is plain text search over literal markers. There is no LaTeX grammar here.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub mod extractor;
pub mod latex;
pub mod markers;
pub mod writer;

/// Stable identifier of a section, e.g. `tagline` or `general_skills`.
/// Used verbatim as the JSON key in the adaptation request and reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One configured section: where it starts, where it ends, and how the prompt names it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub id: SectionId,
    /// Human title shown to the model. Defaults to the id.
    #[serde(default)]
    pub label: Option<String>,
    pub start: String,
    pub end: String,
}

impl SectionSpec {
    pub fn new(id: &str, label: &str, start: &str, end: &str) -> Self {
        Self {
            id: SectionId::new(id),
            label: Some(label.to_string()),
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Marker set of the awesome-cv style résumé this tool was written for.
pub fn default_section_specs() -> Vec<SectionSpec> {
    vec![
        SectionSpec::new("tagline", "Tagline", "\\tagline{", "}"),
        SectionSpec::new("highlightbar", "Skills Sidebar", "\\highlightbar{", "\n}"),
        SectionSpec::new("mainbar", "Work History", "\\mainbar{", "\\makebody"),
        SectionSpec::new(
            "experiences",
            "Detailed Experiences",
            "\\section{Experiences description}",
            "\\makebody",
        ),
        SectionSpec::new(
            "general_skills",
            "General Skills",
            "\\section{General Skills}",
            "\\section{Wheel Chart}",
        ),
    ]
}

/// Loads a marker file: a JSON array of `{ "id", "label"?, "start", "end" }`.
pub fn load_section_specs(path: &Path) -> Result<Vec<SectionSpec>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read marker file '{}'", path.display()))?;
    let specs: Vec<SectionSpec> = serde_json::from_str(&raw)
        .with_context(|| format!("Marker file '{}' is not a valid section list", path.display()))?;
    validate_specs(&specs)?;
    Ok(specs)
}

/// Rejects empty lists, duplicate ids and blank markers.
pub fn validate_specs(specs: &[SectionSpec]) -> Result<()> {
    if specs.is_empty() {
        bail!("At least one section must be configured");
    }

    let mut seen = HashSet::new();
    for spec in specs {
        if spec.id.as_str().trim().is_empty() {
            bail!("Section ids cannot be empty");
        }
        if !seen.insert(&spec.id) {
            bail!("Section '{}' is configured more than once", spec.id);
        }
        if spec.start.trim().is_empty() || spec.end.trim().is_empty() {
            bail!("Section '{}' has a blank start or end marker", spec.id);
        }
    }
    Ok(())
}

/// Keeps only the requested ids, in configuration order.
pub fn select_specs(specs: Vec<SectionSpec>, only: &[String]) -> Result<Vec<SectionSpec>> {
    if only.is_empty() {
        return Ok(specs);
    }

    for wanted in only {
        if !specs.iter().any(|s| s.id.as_str() == wanted) {
            let known: Vec<&str> = specs.iter().map(|s| s.id.as_str()).collect();
            bail!(
                "Unknown section '{wanted}' (configured: {})",
                known.join(", ")
            );
        }
    }

    Ok(specs
        .into_iter()
        .filter(|s| only.iter().any(|w| w == s.id.as_str()))
        .collect())
}
