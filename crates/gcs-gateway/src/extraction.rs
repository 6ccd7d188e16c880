//! Tolerant textual tool-call extraction: a fallback for providers that
//! don't return structured `tool_calls`, where the model instead writes the
//! call as a JSON object in its plain-text reply.

use gcs_core::ToolCallIntent;
use serde_json::Value;

/// Strip a response down to its plain text, find a balanced JSON object
/// containing a `tool_call` field, and translate it into a
/// [`ToolCallIntent`]. Returns `None` if no such object is present, which
/// callers treat as "this is a plain-text answer", not an error.
#[must_use]
pub fn extract_textual_tool_call(text: &str) -> Option<ToolCallIntent> {
    let candidate = strip_markdown_fences(text);
    let json_slice = find_balanced_json_object(candidate)?;
    let value: Value = serde_json::from_str(json_slice).ok()?;
    let call = value.get("tool_call")?;

    let agent_name = call.get("agent_name").and_then(Value::as_str)?;
    let method_name = call.get("method_name").and_then(Value::as_str)?;
    let parameters = call.get("parameters").cloned().unwrap_or_else(|| Value::Object(Default::default()));

    Some(ToolCallIntent {
        id: format!("textual-{agent_name}-{method_name}"),
        name: method_name.to_string(),
        arguments: parameters,
    })
}

fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_lang = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_lang.strip_suffix("```").unwrap_or(without_lang).trim()
}

/// Scan for the first balanced `{...}` span, tolerating nested braces.
fn find_balanced_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            },
            _ => {},
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_json_tool_call() {
        let text = r#"{"tool_call": {"agent_name": "SampleAgentB", "method_name": "perform_website_check", "parameters": {"url": "https://example.com"}}}"#;
        let intent = extract_textual_tool_call(text).unwrap();
        assert_eq!(intent.name, "perform_website_check");
        assert_eq!(intent.arguments["url"], "https://example.com");
    }

    #[test]
    fn strips_markdown_fences() {
        let text = "```json\n{\"tool_call\": {\"agent_name\": \"A\", \"method_name\": \"b\", \"parameters\": {}}}\n```";
        let intent = extract_textual_tool_call(text).unwrap();
        assert_eq!(intent.name, "b");
    }

    #[test]
    fn plain_text_without_tool_call_yields_none() {
        assert!(extract_textual_tool_call("Just a normal answer, no tools needed.").is_none());
    }

    #[test]
    fn tolerates_surrounding_prose() {
        let text = "Sure, let me check that.\n{\"tool_call\": {\"agent_name\": \"A\", \"method_name\": \"b\", \"parameters\": {\"x\": 1}}}\nOne moment.";
        let intent = extract_textual_tool_call(text).unwrap();
        assert_eq!(intent.name, "b");
    }
}
