//! Best-effort "Suggested Agents:" extraction from a final answer.
//!
//! Advisory only: a parse miss is not an error, it just means no suggestion
//! was offered. Never required for a valid turn.

use regex::Regex;
use std::sync::OnceLock;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?im)^\s*Suggested Agents:\s*(.+)\s*$").expect("static pattern is valid"))
}

/// Strip a trailing `Suggested Agents: a, b, c` line from `text`, returning
/// the cleaned text and the parsed names (if any).
#[must_use]
pub fn extract_suggested_agents(text: &str) -> (String, Option<Vec<String>>) {
    let Some(captures) = pattern().captures(text) else {
        return (text.to_string(), None);
    };

    let names: Vec<String> = captures[1]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let cleaned = pattern().replace(text, "").trim_end().to_string();
    let names = if names.is_empty() { None } else { Some(names) };
    (cleaned, names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_suggested_agents_line() {
        let text = "The domain does not exist.\nSuggested Agents: dns_lookup, website_check";
        let (cleaned, agents) = extract_suggested_agents(text);
        assert_eq!(cleaned, "The domain does not exist.");
        assert_eq!(agents, Some(vec!["dns_lookup".to_string(), "website_check".to_string()]));
    }

    #[test]
    fn absent_line_yields_none_and_unchanged_text() {
        let (cleaned, agents) = extract_suggested_agents("Just a plain answer.");
        assert_eq!(cleaned, "Just a plain answer.");
        assert!(agents.is_none());
    }

    #[test]
    fn blank_suggestion_list_yields_none() {
        let (_, agents) = extract_suggested_agents("An answer.\nSuggested Agents: ");
        assert!(agents.is_none());
    }
}
