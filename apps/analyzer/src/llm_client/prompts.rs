// Cross-cutting prompt fragments shared by every reasoning call.
// Each stage that talks to the model keeps its own prompts alongside it.

/// Formatting rules appended to every prompt that expects JSON back.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appends the JSON-only rules to a prompt body.
pub fn json_only(prompt: &str) -> String {
    format!("{prompt}\n\n{JSON_ONLY_INSTRUCTION}")
}
