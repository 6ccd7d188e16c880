//! The deterministic error shortcut: when every tool result in a round is a
//! recognised domain-level failure, synthesise the turn's answer without a
//! further LLM call.

use gcs_core::ToolResult;
use serde_json::Value;

const RECOGNIZED_ERROR_TYPES: &[(&str, &str)] = &[("DNS_ERROR", "The domain does not exist.")];

fn recognized_message(error_type: &str) -> Option<&'static str> {
    RECOGNIZED_ERROR_TYPES.iter().find(|(code, _)| *code == error_type).map(|(_, msg)| *msg)
}

fn failure_detail(result: &ToolResult) -> Option<String> {
    let value: Value = serde_json::from_str(&result.llm_content).ok()?;
    if value.get("status").and_then(Value::as_str) != Some("error") {
        return None;
    }
    if let Some(message) = value.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }
    let error_type = value.get("error_type").and_then(Value::as_str)?;
    recognized_message(error_type).map(str::to_string)
}

/// If every result in `results` is a recognised domain-level error, return
/// the deterministic answer text. Returns `None` (falling back to the
/// normal LLM round) if any result is absent, successful, or carries an
/// unrecognised error shape.
#[must_use]
pub fn deterministic_shortcut(results: &[ToolResult]) -> Option<String> {
    if results.is_empty() {
        return None;
    }
    let mut fragments = Vec::with_capacity(results.len());
    for result in results {
        fragments.push(failure_detail(result)?);
    }
    fragments.dedup();
    Some(fragments.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_recognized_failures_synthesize_an_answer() {
        let results = vec![
            ToolResult::success("website_check", r#"{"status":"error","error_type":"DNS_ERROR"}"#),
            ToolResult::success("dns_lookup", r#"{"status":"error","message":"Domain does not exist"}"#),
        ];
        let answer = deterministic_shortcut(&results).unwrap();
        assert!(answer.contains("does not exist"));
    }

    #[test]
    fn a_successful_result_blocks_the_shortcut() {
        let results = vec![
            ToolResult::success("website_check", r#"{"status":"ok"}"#),
            ToolResult::success("dns_lookup", r#"{"status":"error","message":"Domain does not exist"}"#),
        ];
        assert!(deterministic_shortcut(&results).is_none());
    }

    #[test]
    fn unrecognized_error_type_blocks_the_shortcut() {
        let results = vec![ToolResult::success("x", r#"{"status":"error","error_type":"WEIRD"}"#)];
        assert!(deterministic_shortcut(&results).is_none());
    }

    #[test]
    fn unstructured_content_blocks_the_shortcut() {
        let results = vec![ToolResult::failure("x", "something broke")];
        assert!(deterministic_shortcut(&results).is_none());
    }

    #[test]
    fn empty_round_has_no_shortcut() {
        assert!(deterministic_shortcut(&[]).is_none());
    }
}
