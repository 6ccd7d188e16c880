//! OAuth Device-Flow Client.
//!
//! Implements the device-authorization grant with PKCE S256: request a
//! device code, show the user a verification URL, then poll the token
//! endpoint until they complete authorization, the code expires, or
//! access is denied.

use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::credentials::Credentials;
use crate::error::{AuthError, AuthResult};

const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
const MIN_VERIFIER_LEN: usize = 43;
const MAX_VERIFIER_LEN: usize = 128;
const SLOW_DOWN_INCREMENT: Duration = Duration::from_secs(5);

/// A PKCE code verifier / challenge pair.
#[derive(Debug, Clone)]
pub struct Pkce {
    /// The secret verifier, sent only to the token endpoint.
    pub verifier: String,
    /// `base64url(SHA-256(verifier))`, padding stripped, sent to the
    /// authorization endpoint.
    pub challenge: String,
}

impl Pkce {
    /// Generate a new verifier of random length in `[43, 128]` from the
    /// URL-safe PKCE charset, and derive its S256 challenge.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let len = rng.gen_range(MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN);
        let verifier: String = (0..len)
            .map(|_| {
                let idx = rng.gen_range(0..VERIFIER_CHARSET.len());
                VERIFIER_CHARSET[idx] as char
            })
            .collect();
        let challenge = Self::challenge_for(&verifier);
        Self { verifier, challenge }
    }

    fn challenge_for(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
    }
}

/// Static endpoint + client configuration for the device flow.
#[derive(Debug, Clone)]
pub struct DeviceFlowConfig {
    /// OAuth client id (e.g. from `QWEN_CLIENT_ID`).
    pub client_id: String,
    /// Authorization server base URL (e.g. from `QWEN_AUTHORIZATION_SERVER`).
    pub authorization_server: String,
}

impl DeviceFlowConfig {
    fn device_code_endpoint(&self) -> String {
        format!("{}/oauth/device/code", self.authorization_server.trim_end_matches('/'))
    }

    fn token_endpoint(&self) -> String {
        format!("{}/oauth/token", self.authorization_server.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    #[serde(default)]
    verification_uri_complete: Option<String>,
    #[serde(default = "default_interval")]
    interval: u64,
    #[allow(dead_code)]
    expires_in: u64,
}

fn default_interval() -> u64 {
    5
}

/// What the caller should show the user while polling.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceAuthorization {
    /// The short code the user enters at `verification_uri`.
    pub user_code: String,
    /// The URL the user should visit.
    pub verification_uri: String,
    /// A URL that encodes the user code already, if the server provided one.
    pub verification_uri_complete: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "error")]
enum TokenPollError {
    #[serde(rename = "authorization_pending")]
    AuthorizationPending,
    #[serde(rename = "slow_down")]
    SlowDown,
    #[serde(rename = "expired_token")]
    ExpiredToken,
    #[serde(rename = "access_denied")]
    AccessDenied,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TokenSuccessResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default = "crate::credentials::default_token_type")]
    token_type: String,
    expires_in: i64,
    #[serde(default)]
    resource_url: Option<String>,
}

/// OAuth device-flow client.
pub struct DeviceFlowClient {
    http: reqwest::Client,
    config: DeviceFlowConfig,
}

impl DeviceFlowClient {
    /// Build a client for the given endpoint configuration.
    #[must_use]
    pub fn new(config: DeviceFlowConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Start the device-authorization grant and return what to show the
    /// user; call [`Self::poll`] with the returned device code afterwards.
    ///
    /// # Errors
    /// Returns [`AuthError::RequestFailed`] on transport failure.
    pub async fn authenticate(&self) -> AuthResult<(DeviceAuthorization, String, Pkce, u64)> {
        let pkce = Pkce::generate();
        let resp = self
            .http
            .post(self.config.device_code_endpoint())
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("code_challenge", pkce.challenge.as_str()),
                ("code_challenge_method", "S256"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<DeviceCodeResponse>()
            .await?;

        info!(verification_uri = %resp.verification_uri, "device authorization started");

        Ok((
            DeviceAuthorization {
                user_code: resp.user_code,
                verification_uri: resp.verification_uri,
                verification_uri_complete: resp.verification_uri_complete,
            },
            resp.device_code,
            pkce,
            resp.interval,
        ))
    }

    /// Poll the token endpoint until the user completes authorization, the
    /// device code expires, or access is denied.
    ///
    /// # Errors
    /// [`AuthError::DeviceCodeExpired`], [`AuthError::AccessDenied`], or
    /// [`AuthError::ServerError`] depending on the poll response.
    pub async fn poll(&self, device_code: &str, pkce: &Pkce, mut interval_secs: u64) -> AuthResult<Credentials> {
        loop {
            tokio::time::sleep(Duration::from_secs(interval_secs)).await;

            let resp = self
                .http
                .post(self.config.token_endpoint())
                .form(&[
                    ("client_id", self.config.client_id.as_str()),
                    ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
                    ("device_code", device_code),
                    ("code_verifier", pkce.verifier.as_str()),
                ])
                .send()
                .await?;

            if resp.status().is_success() {
                let body: TokenSuccessResponse = resp.json().await?;
                return Ok(token_response_to_credentials(body));
            }

            let body: TokenPollError = resp.json().await.unwrap_or(TokenPollError::Other);
            match body {
                TokenPollError::AuthorizationPending => {
                    debug!("authorization still pending");
                },
                TokenPollError::SlowDown => {
                    interval_secs += SLOW_DOWN_INCREMENT.as_secs();
                    warn!(new_interval = interval_secs, "server requested slow_down");
                },
                TokenPollError::ExpiredToken => return Err(AuthError::DeviceCodeExpired),
                TokenPollError::AccessDenied => return Err(AuthError::AccessDenied),
                TokenPollError::Other => return Err(AuthError::ServerError("unrecognised token error".into())),
            }
        }
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// A `400` response is a terminal signal: the caller (the credential
    /// store) is expected to clear credentials on this error.
    ///
    /// # Errors
    /// [`AuthError::RefreshRejected`] on HTTP 400; [`AuthError::RequestFailed`]
    /// on transport failure.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<Credentials> {
        let resp = self
            .http
            .post(self.config.token_endpoint())
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::BAD_REQUEST {
            return Err(AuthError::RefreshRejected);
        }
        let body: TokenSuccessResponse = resp.error_for_status()?.json().await?;
        Ok(token_response_to_credentials(body))
    }
}

fn token_response_to_credentials(body: TokenSuccessResponse) -> Credentials {
    Credentials {
        access_token: body.access_token,
        refresh_token: body.refresh_token,
        token_type: body.token_type,
        expires_at: chrono::Utc::now() + chrono::Duration::seconds(body.expires_in),
        resource_url: body.resource_url,
        extra: std::collections::HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkce_verifier_length_in_range() {
        let pkce = Pkce::generate();
        assert!(pkce.verifier.len() >= MIN_VERIFIER_LEN);
        assert!(pkce.verifier.len() <= MAX_VERIFIER_LEN);
        assert!(pkce.verifier.chars().all(|c| VERIFIER_CHARSET.contains(&(c as u8))));
    }

    #[test]
    fn pkce_challenge_is_deterministic_sha256() {
        let challenge = Pkce::challenge_for("abc");
        let digest = Sha256::digest(b"abc");
        let expected = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest);
        assert_eq!(challenge, expected);
    }

    #[test]
    fn pkce_challenge_has_no_padding() {
        let pkce = Pkce::generate();
        assert!(!pkce.challenge.contains('='));
    }
}
