//! Bearer-token sources for providers that require auth.

use async_trait::async_trait;
use gcs_auth::{AuthError, CredentialStore, DeviceFlowClient};
use std::sync::Arc;

use crate::error::{LlmError, LlmResult};

/// Supplies a bearer token for each outbound LLM request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetch a currently-valid token, refreshing it if needed.
    async fn token(&self) -> LlmResult<String>;
}

/// A token source backed by a static, pre-configured API key (no OAuth).
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> LlmResult<String> {
        if self.0.is_empty() {
            return Err(LlmError::Auth("API key not configured".into()));
        }
        Ok(self.0.clone())
    }
}

/// A token source backed by the OAuth credential store and device-flow
/// client, obtaining/refreshing a bearer token before each call.
pub struct OAuthTokenSource {
    store: Arc<CredentialStore>,
    device_flow: Arc<DeviceFlowClient>,
}

impl OAuthTokenSource {
    /// Construct a source from a credential store and device-flow client.
    #[must_use]
    pub fn new(store: Arc<CredentialStore>, device_flow: Arc<DeviceFlowClient>) -> Self {
        Self { store, device_flow }
    }
}

#[async_trait]
impl TokenSource for OAuthTokenSource {
    async fn token(&self) -> LlmResult<String> {
        let device_flow = Arc::clone(&self.device_flow);
        self.store
            .get_valid_access_token(move |refresh_token| async move {
                device_flow.refresh(&refresh_token).await
            })
            .await
            .map_err(|e| match e {
                AuthError::NoValidCredentials => LlmError::Auth("no valid credentials".into()),
                other => LlmError::Auth(other.to_string()),
            })
    }
}
