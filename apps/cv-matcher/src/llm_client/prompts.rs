// Shared prompt fragments. Each module that calls the LLM keeps its own
// prompts.rs next to it; only cross-cutting instructions live here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Truthfulness rules for any rewrite of CV content.
pub const TRUTHFULNESS_INSTRUCTION: &str = "\
STRICT RULES:
1. DO NOT invent or add any skills, experiences, or qualifications that are not already in the CV
2. DO NOT exaggerate or lie about capabilities, scope, seniority or results
3. ONLY reformulate, reorder, and highlight existing content
4. Prefer the job description's own keywords, but only where they truthfully describe existing content
5. Keep the LaTeX formatting intact: keep every command and environment, and keep any unmatched brace a section is marked with exactly as given
6. Maintain professional tone and clarity";
