//! `website_check` — probes a URL over HTTP and reports reachability.

use async_trait::async_trait;
use gcs_core::RuntimeHandle;
use gcs_execution::{ExecutionError, ExecutionResult, LocalToolHandler};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Checks whether a URL responds to an HTTP GET.
pub struct WebsiteCheckTool {
    client: reqwest::Client,
}

impl WebsiteCheckTool {
    /// Build the tool with its own short-timeout HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self { client: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_default() }
    }

    /// This tool's registry definition: a required `url` string parameter,
    /// read-only so the `auto` approval tier admits it without a prompt.
    #[must_use]
    pub fn definition() -> gcs_core::ToolDefinition {
        gcs_core::ToolDefinition::local("website_check", "Checks whether a URL is reachable over HTTP.")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "URL to probe, e.g. https://example.com" },
                },
                "required": ["url"],
            }))
            .with_approval_policy(gcs_core::ApprovalPolicy::Auto)
    }
}

impl Default for WebsiteCheckTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalToolHandler for WebsiteCheckTool {
    async fn execute(&self, parameters: Value, _runtime: &Arc<dyn RuntimeHandle>) -> ExecutionResult<String> {
        let url = parameters
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| ExecutionError::ValidationFailed { tool: "website_check".into(), reason: "url is required".into() })?;

        let outcome = match self.client.get(url).send().await {
            Ok(resp) => serde_json::json!({"status": "ok", "status_code": resp.status().as_u16()}),
            Err(e) => {
                debug!(url, error = %e, "website_check probe failed");
                serde_json::json!({"status": "error", "error_type": classify(&e)})
            },
        };
        Ok(outcome.to_string())
    }
}

fn classify(error: &reqwest::Error) -> &'static str {
    let text = error.to_string().to_ascii_lowercase();
    if text.contains("dns") {
        "DNS_ERROR"
    } else if error.is_timeout() {
        "TIMEOUT"
    } else {
        "UNREACHABLE"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_is_local_read_only_and_requires_url() {
        let def = WebsiteCheckTool::definition();
        assert_eq!(def.kind, gcs_core::ToolKind::Local);
        assert_eq!(def.approval_policy, gcs_core::ApprovalPolicy::Auto);
        assert!(def.has_valid_schema_shape());
        assert_eq!(def.parameters["required"][0], "url");
    }

    #[tokio::test]
    async fn missing_url_is_a_validation_error() {
        let runtime: Arc<dyn RuntimeHandle> = Arc::new(gcs_core::testing::StubRuntime::default());
        let err = WebsiteCheckTool::new().execute(serde_json::json!({}), &runtime).await.unwrap_err();
        assert!(matches!(err, ExecutionError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_reports_a_structured_error_without_failing_execution() {
        let runtime: Arc<dyn RuntimeHandle> = Arc::new(gcs_core::testing::StubRuntime::default());
        let content = WebsiteCheckTool::new()
            .execute(serde_json::json!({"url": "http://this-host-does-not-resolve.invalid"}), &runtime)
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["status"], "error");
    }
}
