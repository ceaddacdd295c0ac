//! Isolates the JSON object inside free-form model output.

/// Returns the slice from the first `{` to the last `}` of a model reply,
/// after dropping any markdown code fences around it.
///
/// Models routinely wrap JSON in ```json fences or add a sentence before or
/// after it; everything outside the outermost braces is discarded.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let text = strip_json_fences(text);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = if let Some(stripped) = text.strip_prefix("```json") {
        stripped
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
    } else {
        return text;
    };
    let inner = inner.trim_start();
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_object(input), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_fenced_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_object(input), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_unfenced() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(extract_json_object(input), Some(input));
    }

    #[test]
    fn test_prefixed_and_suffixed_prose() {
        let input = "Here is the analysis:\n{\"a\": {\"b\": 1}}\nLet me know if you need more.";
        assert_eq!(extract_json_object(input), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_prose_around_fenced_block() {
        let input = "Sure!\n```json\n{\"skills\": [\"Rust\"]}\n```\nDone.";
        assert_eq!(extract_json_object(input), Some("{\"skills\": [\"Rust\"]}"));
    }

    #[test]
    fn test_unterminated_fence() {
        let input = "```json\n{\"key\": 1}";
        assert_eq!(extract_json_object(input), Some("{\"key\": 1}"));
    }

    #[test]
    fn test_no_object() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
        assert_eq!(extract_json_object(""), None);
    }
}
