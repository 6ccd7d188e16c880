//! Environment-variable layering, read once at kernel construction.
//!
//! `MAX_CONTEXT_SIZE` governs the LLM provider's context window (tokens);
//! `COMPRESSION_THRESHOLD` governs the conversation store's character budget
//! before it asks the gateway to summarise — the two are deliberately
//! distinct knobs for distinct subsystems.

use std::path::PathBuf;
use std::time::Duration;

/// Runtime-wide settings assembled from environment variables, layered over
/// hard-coded defaults. Constructed once and threaded through the kernel.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding named-configuration manifests.
    pub config_dir: PathBuf,
    /// Directory holding agent/tool definitions outside the compiled-in set.
    pub agents_dir: PathBuf,
    /// Directory holding persisted runtime state (credentials, server registry).
    pub runtime_data_dir: PathBuf,
    /// LLM model name.
    pub llm_model: String,
    /// LLM chat-completions endpoint.
    pub llm_base_url: Option<String>,
    /// Static LLM API key, if not using OAuth.
    pub llm_api_key: Option<String>,
    /// Per-request LLM timeout.
    pub llm_timeout: Duration,
    /// LLM provider context window, in tokens.
    pub max_context_size: usize,
    /// Conversation store message-count budget.
    pub max_history_length: usize,
    /// Conversation store character budget before compression.
    pub compression_threshold: usize,
    /// OAuth client id for the device flow.
    pub qwen_client_id: Option<String>,
    /// OAuth authorization server base URL for the device flow.
    pub qwen_authorization_server: Option<String>,
}

fn env_path(key: &str, default: impl FnOnce() -> PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or_else(|_| default())
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn home_subdir(leaf: &str) -> PathBuf {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".gcs").join(leaf)).unwrap_or_else(|| PathBuf::from(leaf))
}

impl Settings {
    /// Read settings from the process environment, falling back to the
    /// documented defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            config_dir: env_path("CONFIG_DIR", || home_subdir("configs")),
            agents_dir: env_path("AGENTS_DIR", || home_subdir("agents")),
            runtime_data_dir: env_path("RUNTIME_DATA_DIR", || home_subdir("")),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            llm_base_url: std::env::var("LLM_BASE_URL").ok(),
            llm_api_key: std::env::var("LLM_API_KEY").ok(),
            llm_timeout: Duration::from_secs(env_usize("LLM_TIMEOUT_SECS", 30) as u64),
            max_context_size: env_usize("MAX_CONTEXT_SIZE", 32_768),
            max_history_length: env_usize("MAX_HISTORY_LENGTH", 20),
            compression_threshold: env_usize("COMPRESSION_THRESHOLD", 8000),
            qwen_client_id: std::env::var("QWEN_CLIENT_ID").ok(),
            qwen_authorization_server: std::env::var("QWEN_AUTHORIZATION_SERVER").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        for key in ["MAX_CONTEXT_SIZE", "MAX_HISTORY_LENGTH", "COMPRESSION_THRESHOLD"] {
            std::env::remove_var(key);
        }
        let settings = Settings::from_env();
        assert_eq!(settings.max_context_size, 32_768);
        assert_eq!(settings.max_history_length, 20);
        assert_eq!(settings.compression_threshold, 8000);
    }

    #[test]
    fn env_overrides_are_applied() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("MAX_HISTORY_LENGTH", "5");
        let settings = Settings::from_env();
        assert_eq!(settings.max_history_length, 5);
        std::env::remove_var("MAX_HISTORY_LENGTH");
    }
}
