//! Section Writer — substitutes validated replacements back into the document.
//!
//! Only the bytes inside each replaced section change. Markers, everything between
//! sections and the original padding around each section's content are kept.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::adaptation::AdaptationResult;
use crate::errors::PipelineError;
use crate::sections::extractor::{ExtractedSections, Section};
use crate::sections::SectionId;

#[derive(Debug, Error)]
pub enum SubstitutionError {
    #[error("replacement given for unknown section '{0}'")]
    UnknownSection(SectionId),

    #[error("document changed between extraction and substitution")]
    StaleDocument,
}

/// Produces the adapted document. Sections absent from `result` are left as-is.
pub fn apply_adaptations(
    document: &str,
    sections: &ExtractedSections,
    result: &AdaptationResult,
) -> Result<String, SubstitutionError> {
    if !sections.matches_document(document) {
        return Err(SubstitutionError::StaleDocument);
    }

    for (id, _) in result.iter() {
        if sections.get(id).is_none() {
            return Err(SubstitutionError::UnknownSection(id.clone()));
        }
    }

    let mut output = String::with_capacity(document.len());
    let mut cursor = 0;

    // Sections are sorted and disjoint, so one forward pass suffices.
    for section in sections.iter() {
        let Some(replacement) = result.get(&section.id) else {
            continue;
        };
        output.push_str(&document[cursor..section.range.start]);
        output.push_str(&fit_replacement(section, replacement));
        cursor = section.range.end;
        debug!("Substituted section '{}'", section.id);
    }
    output.push_str(&document[cursor..]);

    Ok(output)
}

/// Shapes raw model output into what will actually be written for `section`:
/// echoed markers are dropped, the text is trimmed and the original content's
/// leading and trailing whitespace is put back around it.
pub fn fit_replacement(section: &Section, replacement: &str) -> String {
    let core = strip_marker_echo(
        replacement.trim(),
        &section.start_marker,
        &section.end_marker,
    );
    let (leading, trailing) = padding(&section.content);
    format!("{leading}{core}{trailing}")
}

fn strip_marker_echo<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    text.strip_prefix(start.trim())
        .and_then(|rest| rest.strip_suffix(end.trim()))
        .map(str::trim)
        .unwrap_or(text)
}

fn padding(content: &str) -> (&str, &str) {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return (content, "");
    }
    let leading = &content[..content.len() - content.trim_start().len()];
    let trailing = &content[content.trim_end().len()..];
    (leading, trailing)
}

/// Writes `text` to `path` through a temporary file in the same directory and an
/// atomic rename. Nothing is left at `path` when any step fails.
pub fn write_document(path: &Path, text: &str) -> Result<(), PipelineError> {
    let to_error = |source: std::io::Error| PipelineError::WriteTarget {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent).map_err(to_error)?;
    tmp.write_all(text.as_bytes()).map_err(to_error)?;
    tmp.as_file().sync_all().map_err(to_error)?;
    tmp.persist(path).map_err(|e| to_error(e.error))?;

    Ok(())
}
