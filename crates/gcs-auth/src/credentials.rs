//! Credential Store.
//!
//! A single JSON file (`oauth_creds.json`) guarded by an advisory file lock
//! for cross-process safety, with a short in-memory freshness cache to avoid
//! re-reading the file on every call. Writes go through a temp-file +
//! rename so a crash mid-write never leaves a partially-written file, and
//! the file is chmod'd to owner read/write only.

use chrono::{DateTime, TimeZone, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};

/// The buffer required before treating a token as usable without
/// refreshing.
const EXPIRY_BUFFER: chrono::Duration = chrono::Duration::minutes(5);

/// In-memory cache freshness window.
const CACHE_FRESHNESS: Duration = Duration::from_secs(30);

/// Default file-lock wait before failing with `LOCK_TIMEOUT`.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Threshold above which a numeric expiry is assumed to be milliseconds
/// rather than seconds.
const EPOCH_MAGNITUDE_MS_THRESHOLD: f64 = 1e10;

/// OAuth credentials as persisted to `oauth_creds.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer access token.
    pub access_token: String,
    /// Refresh token used to mint a new access token.
    pub refresh_token: String,
    /// Token type, typically `"Bearer"`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Absolute expiry instant.
    #[serde(rename = "expiry_date", with = "expiry_serde")]
    pub expires_at: DateTime<Utc>,
    /// Resource server URL, for providers that scope tokens to a resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<String>,
    /// Any additional provider-specific fields, round-tripped verbatim.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

pub(crate) fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Credentials {
    /// Whether this token is still usable, i.e. its expiry is more than the
    /// 5-minute buffer in the future.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        Utc::now() + EXPIRY_BUFFER < self.expires_at
    }
}

/// Tolerant (de)serialization of `expiry_date`: accepts an ISO-8601 string,
/// epoch seconds, or epoch milliseconds (disambiguated by magnitude).
mod expiry_serde {
    use super::{DateTime, EPOCH_MAGNITUDE_MS_THRESHOLD, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let value = Value::deserialize(d)?;
        parse(&value).ok_or_else(|| serde::de::Error::custom("invalid expiry_date"))
    }

    fn parse(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => {
                let raw = n.as_f64()?;
                let secs = if raw.abs() > EPOCH_MAGNITUDE_MS_THRESHOLD {
                    raw / 1000.0
                } else {
                    raw
                };
                Utc.timestamp_opt(secs as i64, 0).single()
            },
            _ => None,
        }
    }
}

/// Where the credentials file lives, and how long to wait for the lock.
#[derive(Debug, Clone)]
pub struct CredentialStoreConfig {
    /// Path to the credentials JSON file.
    pub path: PathBuf,
    /// Maximum time to wait for the advisory file lock.
    pub lock_timeout: Duration,
}

impl CredentialStoreConfig {
    /// Resolve the store location: an explicit override if given, otherwise
    /// `RUNTIME_DATA_DIR`/oauth_creds.json, otherwise the user-home default.
    #[must_use]
    pub fn resolve(explicit_override: Option<PathBuf>) -> Self {
        let path = explicit_override
            .or_else(|| std::env::var("RUNTIME_DATA_DIR").ok().map(PathBuf::from).map(|d| d.join("oauth_creds.json")))
            .unwrap_or_else(|| {
                directories::BaseDirs::new()
                    .map(|b| b.home_dir().join(".gcs").join("oauth_creds.json"))
                    .unwrap_or_else(|| PathBuf::from("oauth_creds.json"))
            });
        Self {
            path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

struct Cached {
    value: Option<Credentials>,
    loaded_at: Instant,
}

/// Credential Store.
pub struct CredentialStore {
    config: CredentialStoreConfig,
    cache: RwLock<Option<Cached>>,
}

impl CredentialStore {
    /// Create a store at the resolved default location.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CredentialStoreConfig::resolve(None))
    }

    /// Create a store with an explicit configuration.
    #[must_use]
    pub fn with_config(config: CredentialStoreConfig) -> Self {
        Self {
            config,
            cache: RwLock::new(None),
        }
    }

    /// Load credentials from the in-memory cache if fresh, otherwise from
    /// disk (under the file lock).
    ///
    /// # Errors
    /// Returns `LockTimeout` if the advisory lock cannot be acquired within
    /// the configured timeout, or `MalformedFile`/`Io` on read failures.
    pub async fn load(&self) -> AuthResult<Option<Credentials>> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.loaded_at.elapsed() < CACHE_FRESHNESS {
                    return Ok(cached.value.clone());
                }
            }
        }

        let value = self.load_from_disk()?;
        let mut cache = self.cache.write().await;
        *cache = Some(Cached {
            value: value.clone(),
            loaded_at: Instant::now(),
        });
        Ok(value)
    }

    fn load_from_disk(&self) -> AuthResult<Option<Credentials>> {
        if !self.config.path.exists() {
            return Ok(None);
        }
        let _guard = self.acquire_lock()?;
        let raw = fs::read_to_string(&self.config.path)?;
        let creds: Credentials = serde_json::from_str(&raw).map_err(|e| AuthError::MalformedFile(e.to_string()))?;
        Ok(Some(creds))
    }

    /// Persist credentials atomically (temp-file + rename), chmod'd to
    /// owner read/write only.
    ///
    /// # Errors
    /// Returns `LockTimeout` or `Io` on failure.
    pub async fn save(&self, creds: &Credentials) -> AuthResult<()> {
        let _guard = self.acquire_lock()?;
        if let Some(parent) = self.config.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.config.path.with_extension("tmp");
        let body = serde_json::to_string_pretty(creds).map_err(|e| AuthError::MalformedFile(e.to_string()))?;
        fs::write(&tmp_path, body)?;
        set_owner_only_permissions(&tmp_path)?;
        fs::rename(&tmp_path, &self.config.path)?;

        let mut cache = self.cache.write().await;
        *cache = Some(Cached {
            value: Some(creds.clone()),
            loaded_at: Instant::now(),
        });
        debug!(path = %self.config.path.display(), "credentials saved");
        Ok(())
    }

    /// Whether a valid (non-expired, buffer-adjusted) credential is stored.
    pub async fn has_valid(&self) -> AuthResult<bool> {
        Ok(self.load().await?.is_some_and(|c| c.is_valid()))
    }

    /// Return a usable access token, refreshing via `refresh_fn` if the
    /// stored token is within the expiry buffer.
    ///
    /// `refresh_fn` is supplied by the caller (typically
    /// [`crate::device_flow::DeviceFlowClient::refresh`]) so this crate has
    /// no direct HTTP dependency on the OAuth flow.
    ///
    /// # Errors
    /// `NoValidCredentials` if nothing is stored and no refresh is possible;
    /// propagates refresh errors otherwise.
    pub async fn get_valid_access_token<F, Fut>(&self, refresh_fn: F) -> AuthResult<String>
    where
        F: FnOnce(String) -> Fut,
        Fut: std::future::Future<Output = AuthResult<Credentials>>,
    {
        let current = self.load().await?;
        match current {
            Some(creds) if creds.is_valid() => Ok(creds.access_token),
            Some(creds) => {
                let refreshed = refresh_fn(creds.refresh_token).await?;
                self.save(&refreshed).await?;
                Ok(refreshed.access_token)
            },
            None => Err(AuthError::NoValidCredentials),
        }
    }

    /// Drop the in-memory freshness cache without touching the on-disk
    /// file, so the next [`Self::load`] re-reads from disk. Used on
    /// shutdown, where credentials should stop being trusted for the
    /// remainder of the process but must still be there on restart.
    pub async fn invalidate_cache(&self) {
        *self.cache.write().await = None;
    }

    /// Clear stored credentials (explicit logout, or refresh rejection).
    pub async fn clear(&self) -> AuthResult<()> {
        let _guard = self.acquire_lock()?;
        if self.config.path.exists() {
            fs::remove_file(&self.config.path)?;
        }
        let mut cache = self.cache.write().await;
        *cache = Some(Cached {
            value: None,
            loaded_at: Instant::now(),
        });
        Ok(())
    }

    fn acquire_lock(&self) -> AuthResult<FileLockGuard> {
        let lock_path = lock_file_path(&self.config.path);
        if let Some(parent) = lock_path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;

        let deadline = Instant::now() + self.config.lock_timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLockGuard { file }),
                Err(_) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(25));
                },
                Err(_) => {
                    warn!(path = %lock_path.display(), "credentials file lock timed out");
                    return Err(AuthError::LockTimeout);
                },
            }
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_file_path(creds_path: &Path) -> PathBuf {
    let mut p = creds_path.as_os_str().to_owned();
    p.push(".lock");
    PathBuf::from(p)
}

struct FileLockGuard {
    file: File,
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn sample_creds(expires_in: ChronoDuration) -> Credentials {
        Credentials {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            token_type: "Bearer".into(),
            expires_at: Utc::now() + expires_in,
            resource_url: None,
            extra: HashMap::new(),
        }
    }

    fn store_at(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::with_config(CredentialStoreConfig {
            path: dir.path().join("oauth_creds.json"),
            lock_timeout: Duration::from_secs(2),
        })
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir);
        let creds = sample_creds(ChronoDuration::hours(1));
        store.save(&creds).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, creds.access_token);
        assert_eq!(loaded.expires_at.timestamp(), creds.expires_at.timestamp());
    }

    #[tokio::test]
    async fn save_sets_owner_only_permissions() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let dir = tempfile::tempdir().unwrap();
            let store = store_at(&dir);
            store.save(&sample_creds(ChronoDuration::hours(1))).await.unwrap();
            let mode = fs::metadata(dir.path().join("oauth_creds.json")).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn has_valid_false_when_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir);
        store.save(&sample_creds(ChronoDuration::minutes(1))).await.unwrap();
        assert!(!store.has_valid().await.unwrap());
    }

    #[tokio::test]
    async fn has_valid_true_outside_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir);
        store.save(&sample_creds(ChronoDuration::hours(2))).await.unwrap();
        assert!(store.has_valid().await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir);
        store.save(&sample_creds(ChronoDuration::hours(1))).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_valid_access_token_refreshes_when_near_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir);
        store.save(&sample_creds(ChronoDuration::minutes(1))).await.unwrap();

        let token = store
            .get_valid_access_token(|_refresh_token| async {
                Ok(sample_creds(ChronoDuration::hours(1)))
            })
            .await
            .unwrap();
        assert_eq!(token, "at");
        assert!(store.has_valid().await.unwrap());
    }

    #[tokio::test]
    async fn get_valid_access_token_fails_with_nothing_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir);
        let err = store
            .get_valid_access_token(|_| async { Ok(sample_creds(ChronoDuration::hours(1))) })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoValidCredentials));
    }

    #[test]
    fn expiry_tolerates_epoch_seconds_and_millis() {
        let now = Utc::now();
        let secs = now.timestamp();
        let millis = now.timestamp_millis();

        let from_secs: Credentials = serde_json::from_value(serde_json::json!({
            "access_token": "a", "refresh_token": "r", "expiry_date": secs
        }))
        .unwrap();
        let from_millis: Credentials = serde_json::from_value(serde_json::json!({
            "access_token": "a", "refresh_token": "r", "expiry_date": millis
        }))
        .unwrap();
        assert_eq!(from_secs.expires_at.timestamp(), from_millis.expires_at.timestamp());
    }
}
