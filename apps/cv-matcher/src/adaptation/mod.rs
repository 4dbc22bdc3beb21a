//! Adaptation Client — asks the LLM to reword the extracted sections and turns the
//! reply into a validated `AdaptationResult`.
//!
//! Partial results are never accepted: the key set must equal the requested
//! section ids exactly, and no replacement may change a section's brace balance.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::llm_client::LlmError;
use crate::sections::extractor::ExtractedSections;
use crate::sections::latex::brace_balance;
use crate::sections::writer::fit_replacement;
use crate::sections::SectionId;

pub mod adapter;
pub mod prompts;

#[derive(Debug, Error)]
pub enum AdaptationError {
    #[error("{0}")]
    Reply(LlmError),

    #[error("reply is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("reply is not a JSON object")]
    NotAnObject,

    #[error("value for '{key}' is not a string")]
    NonStringValue { key: String },

    #[error(
        "reply keys do not match the requested sections (missing: [{}], unexpected: [{}])",
        missing.join(", "),
        unexpected.join(", ")
    )]
    KeyMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("section '{section}': replacement changes the brace balance from {expected} to {found}")]
    UnbalancedBraces {
        section: SectionId,
        expected: i64,
        found: i64,
    },

    #[error("replacement given for unknown section '{0}'")]
    UnknownSection(SectionId),
}

/// Validated mapping from section id to replacement text.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptationResult {
    replacements: BTreeMap<SectionId, String>,
}

impl AdaptationResult {
    /// Checks `raw` against the sections that were sent and builds the result.
    pub fn validate(
        raw: BTreeMap<String, String>,
        sections: &ExtractedSections,
    ) -> Result<Self, AdaptationError> {
        let missing: Vec<String> = sections
            .iter()
            .filter(|s| !raw.contains_key(s.id.as_str()))
            .map(|s| s.id.to_string())
            .collect();
        let unexpected: Vec<String> = raw
            .keys()
            .filter(|k| sections.get(&SectionId::new(k.as_str())).is_none())
            .cloned()
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(AdaptationError::KeyMismatch {
                missing,
                unexpected,
            });
        }

        let mut replacements = BTreeMap::new();
        for (key, text) in raw {
            let id = SectionId::new(key);
            let section = sections
                .get(&id)
                .ok_or_else(|| AdaptationError::UnknownSection(id.clone()))?;

            let expected = brace_balance(&section.content);
            let found = brace_balance(&fit_replacement(section, &text));
            if expected != found {
                return Err(AdaptationError::UnbalancedBraces {
                    section: id,
                    expected,
                    found,
                });
            }

            replacements.insert(id, text);
        }

        Ok(Self { replacements })
    }

    pub fn get(&self, id: &SectionId) -> Option<&str> {
        self.replacements.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SectionId, &str)> {
        self.replacements.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }
}
