//! `auth-status` support.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::credentials::CredentialStore;
use crate::error::AuthResult;

/// Snapshot of credential status, backing the `auth-status` CLI subcommand.
#[derive(Debug, Clone, Serialize)]
pub struct AuthStatus {
    /// Whether any credentials are stored at all.
    pub has_credentials: bool,
    /// Whether the stored credentials are currently valid (outside the
    /// refresh buffer).
    pub is_valid: bool,
    /// Expiry instant, if credentials are stored.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Compute the current [`AuthStatus`] for a store.
///
/// # Errors
/// Propagates any [`crate::AuthError`] from loading the store.
pub async fn status(store: &CredentialStore) -> AuthResult<AuthStatus> {
    let creds = store.load().await?;
    Ok(match creds {
        Some(c) => AuthStatus {
            has_credentials: true,
            is_valid: c.is_valid(),
            expires_at: Some(c.expires_at),
        },
        None => AuthStatus {
            has_credentials: false,
            is_valid: false,
            expires_at: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStoreConfig;
    use std::collections::HashMap;
    use std::time::Duration;

    #[tokio::test]
    async fn status_reports_absent_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::with_config(CredentialStoreConfig {
            path: dir.path().join("oauth_creds.json"),
            lock_timeout: Duration::from_secs(1),
        });
        let s = status(&store).await.unwrap();
        assert!(!s.has_credentials);
        assert!(!s.is_valid);
    }

    #[tokio::test]
    async fn status_reports_valid_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::with_config(CredentialStoreConfig {
            path: dir.path().join("oauth_creds.json"),
            lock_timeout: Duration::from_secs(1),
        });
        store
            .save(&crate::Credentials {
                access_token: "a".into(),
                refresh_token: "r".into(),
                token_type: "Bearer".into(),
                expires_at: Utc::now() + chrono::Duration::hours(1),
                resource_url: None,
                extra: HashMap::new(),
            })
            .await
            .unwrap();

        let s = status(&store).await.unwrap();
        assert!(s.has_credentials);
        assert!(s.is_valid);
    }
}
