//! In-process handlers for `local` and `service` tools.

use async_trait::async_trait;
use gcs_core::RuntimeHandle;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ExecutionResult;

/// Executes a single local or service tool in-process.
#[async_trait]
pub trait LocalToolHandler: Send + Sync {
    /// Run the tool, returning the content to feed back to the LLM.
    async fn execute(&self, parameters: Value, runtime: &Arc<dyn RuntimeHandle>) -> ExecutionResult<String>;
}
