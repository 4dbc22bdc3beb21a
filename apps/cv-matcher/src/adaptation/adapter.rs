//! Prompt building, the single LLM call, and reply decoding.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::info;

use crate::adaptation::prompts::{
    ADAPTATION_PROMPT_TEMPLATE, ADAPTATION_SYSTEM, SECTION_BLOCK_TEMPLATE, UNMATCHED_BRACE_NOTE,
};
use crate::adaptation::{AdaptationError, AdaptationResult};
use crate::errors::PipelineError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, TRUTHFULNESS_INSTRUCTION};
use crate::llm_client::{strip_json_fences, TextGenerator};
use crate::sections::extractor::ExtractedSections;
use crate::sections::latex::brace_balance;

/// Sends every extracted section plus the job description to the generator and
/// returns the validated replacements.
pub async fn adapt_sections(
    generator: &dyn TextGenerator,
    sections: &ExtractedSections,
    job_description: &str,
) -> Result<AdaptationResult, PipelineError> {
    let system = format!("{ADAPTATION_SYSTEM} {JSON_ONLY_SYSTEM}");
    let prompt = build_adaptation_prompt(sections, job_description);

    info!("Requesting adaptation of {} sections", sections.len());
    let reply = generator.generate(&system, &prompt).await?;

    let raw = decode_reply(&reply)?;
    let result = AdaptationResult::validate(raw, sections)?;
    info!("Adaptation reply validated ({} sections)", result.len());

    Ok(result)
}

/// Fills the adaptation template with the section contents and the job description.
pub fn build_adaptation_prompt(sections: &ExtractedSections, job_description: &str) -> String {
    let sections_block = sections
        .iter()
        .map(|s| {
            SECTION_BLOCK_TEMPLATE
                .replace("{label}", &s.label)
                .replace("{id}", s.id.as_str())
                .replace("{brace_note}", &brace_note(&s.content))
                .replace("{content}", &s.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let schema: serde_json::Map<String, Value> = sections
        .iter()
        .map(|s| {
            (
                s.id.to_string(),
                Value::String(format!("adapted {} content", s.label)),
            )
        })
        .collect();
    // A map of strings always serializes.
    let response_schema =
        serde_json::to_string_pretty(&Value::Object(schema)).unwrap_or_default();

    ADAPTATION_PROMPT_TEMPLATE
        .replace("{truthfulness_instruction}", TRUTHFULNESS_INSTRUCTION)
        .replace("{response_schema}", &response_schema)
        .replace("{job_description}", job_description.trim())
        .replace("{sections}", &sections_block)
}

fn brace_note(content: &str) -> String {
    let balance = brace_balance(content);
    if balance == 0 {
        return String::new();
    }
    let kind = if balance < 0 { "closing" } else { "opening" };
    UNMATCHED_BRACE_NOTE
        .replace("{count}", &balance.unsigned_abs().to_string())
        .replace("{kind}", kind)
}

/// Decodes the model's text into a flat string → string map.
/// Tolerates a fenced JSON block surrounded by prose; rejects everything else.
pub fn decode_reply(text: &str) -> Result<BTreeMap<String, String>, AdaptationError> {
    let stripped = strip_json_fences(text);
    let candidate = if stripped.starts_with('{') {
        stripped
    } else {
        find_fenced_object(text).unwrap_or(stripped)
    };

    let Value::Object(map) = serde_json::from_str::<Value>(candidate)? else {
        return Err(AdaptationError::NotAnObject);
    };

    map.into_iter()
        .map(|(key, value)| match value {
            Value::String(text) => Ok((key, text)),
            _ => Err(AdaptationError::NonStringValue { key }),
        })
        .collect()
}

fn find_fenced_object(text: &str) -> Option<&str> {
    static FENCED: OnceLock<Option<Regex>> = OnceLock::new();
    FENCED
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").ok())
        .as_ref()?
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
