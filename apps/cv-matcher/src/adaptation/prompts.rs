// LLM prompt constants for CV adaptation.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Persona half of the adaptation system prompt. Joined with `JSON_ONLY_SYSTEM`.
pub const ADAPTATION_SYSTEM: &str = "You are a professional CV optimization expert. \
    You adapt a LaTeX CV to a job description while staying COMPLETELY GROUNDED \
    on the existing content.";

/// Adaptation prompt template.
/// Replace: {truthfulness_instruction}, {sections}, {job_description}, {response_schema}
pub const ADAPTATION_PROMPT_TEMPLATE: &str = r#"{truthfulness_instruction}

ORIGINAL CV SECTIONS (source of truth — ONLY use facts from these):
---
{sections}
---

JOB DESCRIPTION:
---
{job_description}
---

TASK:
Adapt every CV section above to better match the job description. Focus on:
1. Rewriting the tagline to highlight the most relevant experience for this role
2. Reordering or emphasizing work experiences that match the job requirements
3. Reformulating descriptions to use keywords from the job description
4. Putting the most relevant skills first

Return ONLY a JSON object with EXACTLY these keys (no extra keys, none missing),
each mapped to the adapted LaTeX content of that section as a string:
{response_schema}

Each value replaces the section content verbatim, so return the section body only,
without the surrounding section command."#;

/// One section block inside the prompt.
/// Replace: {label}, {id}, {brace_note}, {content}
pub const SECTION_BLOCK_TEMPLATE: &str = "{label} [key: {id}]{brace_note}:\n{content}\n";

/// Appended to a section header when its content does not balance its own braces.
/// Replace: {count}, {kind}
pub const UNMATCHED_BRACE_NOTE: &str =
    " (contains {count} unmatched {kind} brace(s) that close or open the surrounding layout; keep them exactly as given)";
