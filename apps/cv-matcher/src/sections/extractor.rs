//! Section Extractor — finds every configured section in the document.
//!
//! For each spec: first occurrence of the start marker, then the first occurrence
//! of the end marker after it. The content is the text strictly between them.
//! Duplicate markers are not disambiguated: the first match wins.

use std::ops::Range;

use thiserror::Error;
use tracing::debug;

use crate::sections::markers::MarkerPattern;
use crate::sections::{SectionId, SectionSpec};

#[derive(Debug, Error)]
pub enum SectionError {
    #[error("section '{section}': start marker {marker:?} not found")]
    MissingStart { section: SectionId, marker: String },

    #[error("section '{section}': end marker {marker:?} not found after the start marker")]
    MissingEnd { section: SectionId, marker: String },

    #[error("sections '{first}' and '{second}' overlap; the document no longer matches the marker configuration")]
    Overlap { first: SectionId, second: SectionId },

    #[error("section '{section}': marker {marker:?} cannot be compiled: {source}")]
    InvalidMarker {
        section: SectionId,
        marker: String,
        #[source]
        source: regex::Error,
    },
}

/// A located section. `range` is the byte range of `content` inside the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub label: String,
    pub start_marker: String,
    pub end_marker: String,
    pub content: String,
    pub range: Range<usize>,
}

/// All sections found in one document revision, in document order.
#[derive(Debug, Clone)]
pub struct ExtractedSections {
    sections: Vec<Section>,
    source_len: usize,
}

impl ExtractedSections {
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn get(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True when `document` is the revision these sections were extracted from.
    pub fn matches_document(&self, document: &str) -> bool {
        document.len() == self.source_len
            && self
                .sections
                .iter()
                .all(|s| document.get(s.range.clone()) == Some(s.content.as_str()))
    }
}

/// Locates every spec in `document`. Any missing marker aborts extraction.
pub fn extract_sections(
    document: &str,
    specs: &[SectionSpec],
) -> Result<ExtractedSections, SectionError> {
    let mut sections = Vec::with_capacity(specs.len());

    for spec in specs {
        let start = compile(spec, &spec.start)?;
        let end = compile(spec, &spec.end)?;

        let start_match = start
            .find_from(document, 0)
            .ok_or_else(|| SectionError::MissingStart {
                section: spec.id.clone(),
                marker: spec.start.clone(),
            })?;

        let end_match = end
            .find_from(document, start_match.end)
            .ok_or_else(|| SectionError::MissingEnd {
                section: spec.id.clone(),
                marker: spec.end.clone(),
            })?;

        let range = start_match.end..end_match.start;
        debug!(
            "Section '{}' found at bytes {}..{}",
            spec.id, range.start, range.end
        );

        sections.push(Section {
            id: spec.id.clone(),
            label: spec.label().to_string(),
            start_marker: spec.start.clone(),
            end_marker: spec.end.clone(),
            content: document[range.clone()].to_string(),
            range,
        });
    }

    sections.sort_by_key(|s| s.range.start);

    for pair in sections.windows(2) {
        if pair[0].range.end > pair[1].range.start {
            return Err(SectionError::Overlap {
                first: pair[0].id.clone(),
                second: pair[1].id.clone(),
            });
        }
    }

    Ok(ExtractedSections {
        sections,
        source_len: document.len(),
    })
}

fn compile(spec: &SectionSpec, marker: &str) -> Result<MarkerPattern, SectionError> {
    MarkerPattern::new(marker).map_err(|source| SectionError::InvalidMarker {
        section: spec.id.clone(),
        marker: marker.to_string(),
        source,
    })
}
