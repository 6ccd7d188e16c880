//! Named-configuration manifest shape and validation.

use serde::Deserialize;
use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};

/// A single named configuration: which local tools to load, and the domain
/// context to seed new conversations with while it is active.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigManifest {
    /// Configuration name, matched against the requested name at load time.
    pub name: String,
    /// Names of local tools (from the always-on local-tool set) to register
    /// when this configuration is loaded.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Optional domain context text, prepended to the system message for
    /// new conversations opened while this configuration is active.
    #[serde(default)]
    pub domain_context: Option<String>,
}

/// Parse and validate a manifest's raw TOML body.
///
/// # Errors
/// `Malformed` if the TOML does not parse or match the expected shape;
/// `Validation` if required fields are missing or tool names repeat.
pub fn parse(raw: &str) -> ConfigResult<ConfigManifest> {
    let manifest: ConfigManifest = toml::from_str(raw).map_err(|e| ConfigError::Malformed(e.to_string()))?;
    validate(&manifest)?;
    Ok(manifest)
}

fn validate(manifest: &ConfigManifest) -> ConfigResult<()> {
    if manifest.name.trim().is_empty() {
        return Err(ConfigError::Validation { field: "name".to_string(), message: "must not be empty".to_string() });
    }

    let mut seen = HashSet::with_capacity(manifest.tools.len());
    for tool in &manifest.tools {
        if tool.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "tools[]".to_string(),
                message: "tool name must not be empty".to_string(),
            });
        }
        if !seen.insert(tool.as_str()) {
            return Err(ConfigError::Validation {
                field: "tools[]".to_string(),
                message: format!("duplicate tool name '{tool}'"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_manifest() {
        let manifest = parse("name = \"default\"\ntools = [\"website_check\"]\n").unwrap();
        assert_eq!(manifest.name, "default");
        assert_eq!(manifest.tools, vec!["website_check".to_string()]);
        assert!(manifest.domain_context.is_none());
    }

    #[test]
    fn parses_domain_context_when_present() {
        let manifest = parse("name = \"ops\"\ndomain_context = \"You help with networking.\"\n").unwrap();
        assert_eq!(manifest.domain_context.as_deref(), Some("You help with networking."));
    }

    #[test]
    fn rejects_empty_name() {
        let err = parse("name = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field, .. } if field == "name"));
    }

    #[test]
    fn rejects_duplicate_tool_names() {
        let err = parse("name = \"x\"\ntools = [\"a\", \"a\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field, .. } if field == "tools[]"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = parse("not valid toml {{{").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }
}
