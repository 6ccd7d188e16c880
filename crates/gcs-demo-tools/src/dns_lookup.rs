//! `dns_lookup` — resolves a hostname to its IP addresses.

use async_trait::async_trait;
use gcs_core::RuntimeHandle;
use gcs_execution::{ExecutionError, ExecutionResult, LocalToolHandler};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Resolves a hostname via the system resolver.
pub struct DnsLookupTool;

impl DnsLookupTool {
    /// This tool's registry definition: a required `hostname` string
    /// parameter, read-only so the `auto` approval tier admits it.
    #[must_use]
    pub fn definition() -> gcs_core::ToolDefinition {
        gcs_core::ToolDefinition::local("dns_lookup", "Resolves a hostname to its IP addresses.")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "hostname": { "type": "string", "description": "Hostname to resolve, e.g. example.com" },
                },
                "required": ["hostname"],
            }))
            .with_approval_policy(gcs_core::ApprovalPolicy::Auto)
    }
}

#[async_trait]
impl LocalToolHandler for DnsLookupTool {
    async fn execute(&self, parameters: Value, _runtime: &Arc<dyn RuntimeHandle>) -> ExecutionResult<String> {
        let hostname = parameters
            .get("hostname")
            .and_then(Value::as_str)
            .ok_or_else(|| ExecutionError::ValidationFailed { tool: "dns_lookup".into(), reason: "hostname is required".into() })?;

        let outcome = match tokio::net::lookup_host((hostname, 0u16)).await {
            Ok(addrs) => {
                let addresses: Vec<String> = addrs.map(|a| a.ip().to_string()).collect();
                serde_json::json!({"status": "ok", "addresses": addresses})
            },
            Err(e) => {
                debug!(hostname, error = %e, "dns_lookup resolution failed");
                serde_json::json!({"status": "error", "message": "Domain does not exist"})
            },
        };
        Ok(outcome.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_is_local_read_only_and_requires_hostname() {
        let def = DnsLookupTool::definition();
        assert_eq!(def.kind, gcs_core::ToolKind::Local);
        assert_eq!(def.approval_policy, gcs_core::ApprovalPolicy::Auto);
        assert_eq!(def.parameters["required"][0], "hostname");
    }

    #[tokio::test]
    async fn missing_hostname_is_a_validation_error() {
        let runtime: Arc<dyn RuntimeHandle> = Arc::new(gcs_core::testing::StubRuntime::default());
        let err = DnsLookupTool.execute(serde_json::json!({}), &runtime).await.unwrap_err();
        assert!(matches!(err, ExecutionError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn unresolvable_domain_reports_a_structured_error_without_failing_execution() {
        let runtime: Arc<dyn RuntimeHandle> = Arc::new(gcs_core::testing::StubRuntime::default());
        let content = DnsLookupTool
            .execute(serde_json::json!({"hostname": "this-domain-does-not-exist.invalid"}), &runtime)
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["message"], "Domain does not exist");
    }
}
