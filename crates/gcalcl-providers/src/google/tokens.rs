//! OAuth token persistence.
//!
//! Tokens live in a single JSON file readable only by the owner. The file is
//! written through a temporary sibling and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Seconds subtracted from the server-reported lifetime so that a token is
/// refreshed before Google starts rejecting it.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A set of OAuth tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Bearer token for API requests.
    pub access_token: String,
    /// Long-lived token used to obtain new access tokens.
    pub refresh_token: Option<String>,
    /// When the access token stops being usable.
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// When the access token was last obtained.
    pub last_refresh: DateTime<Utc>,
}

impl TokenInfo {
    /// Creates a token set from an OAuth token response.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expiry_from(now, expires_in_secs),
            scopes,
            last_refresh: now,
        }
    }

    /// Returns true when the access token has expired. Tokens without an
    /// expiry never do.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Returns true when every scope in `required` was granted.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Replaces the access token after a refresh. A new refresh token, when
    /// the server rotates it, replaces the old one.
    pub fn refreshed(
        mut self,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
    ) -> Self {
        let now = Utc::now();
        self.access_token = access_token.into();
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        self.expires_at = expiry_from(now, expires_in_secs);
        self.last_refresh = now;
        self
    }
}

fn expiry_from(now: DateTime<Utc>, expires_in_secs: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in_secs.map(|secs| now + Duration::seconds(secs - EXPIRY_MARGIN_SECS))
}

/// File-backed token store.
#[derive(Debug, Clone)]
pub struct TokenStorage {
    path: PathBuf,
}

impl TokenStorage {
    /// Creates a store at `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the stored tokens. Returns `None` when no token file exists.
    pub fn load(&self) -> ProviderResult<Option<TokenInfo>> {
        if !self.path.exists() {
            debug!("no token file at {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to read token file: {}", e))
                .with_source(e)
        })?;
        let tokens = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to parse token file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("loaded tokens from {}", self.path.display());
        Ok(Some(tokens))
    }

    /// Writes `tokens` to disk with owner-only permissions.
    pub fn save(&self, tokens: &TokenInfo) -> ProviderResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration(format!("failed to create token directory: {}", e))
                    .with_source(e)
            })?;
        }

        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| ProviderError::internal(format!("failed to serialize tokens: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| {
            ProviderError::configuration(format!("failed to write token file: {}", e))
                .with_source(e)
        })?;
        restrict_permissions(&temp_path)?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to move token file into place: {}", e))
                .with_source(e)
        })?;

        debug!("saved tokens to {}", self.path.display());
        Ok(())
    }

    /// Removes the token file if present.
    pub fn clear(&self) -> ProviderResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                ProviderError::configuration(format!("failed to remove token file: {}", e))
                    .with_source(e)
            })?;
            info!("removed tokens at {}", self.path.display());
        }
        Ok(())
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> ProviderResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
        ProviderError::configuration(format!("failed to restrict token file permissions: {}", e))
            .with_source(e)
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> ProviderResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCOPE: &str = "https://www.googleapis.com/auth/calendar";

    fn sample() -> TokenInfo {
        TokenInfo::new("ya29.access", Some("1//refresh".into()), Some(3600), vec![SCOPE.into()])
    }

    #[test]
    fn fresh_token_is_not_expired() {
        let token = sample();
        assert!(!token.is_expired());
        let remaining = token.expires_at.unwrap() - Utc::now();
        assert!(remaining <= Duration::seconds(3600 - EXPIRY_MARGIN_SECS));
    }

    #[test]
    fn past_expiry_is_expired() {
        let mut token = sample();
        token.expires_at = Some(Utc::now() - Duration::minutes(5));
        assert!(token.is_expired());

        token.expires_at = None;
        assert!(!token.is_expired());
    }

    #[test]
    fn scope_check() {
        let token = sample();
        assert!(token.has_scopes(&[SCOPE.to_string()]));
        assert!(!token.has_scopes(&["https://www.googleapis.com/auth/tasks".to_string()]));
    }

    #[test]
    fn refresh_keeps_refresh_token_unless_rotated() {
        let token = sample().refreshed("ya29.new", None, Some(3600));
        assert_eq!(token.access_token, "ya29.new");
        assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));

        let rotated = token.refreshed("ya29.newer", Some("1//rotated".into()), None);
        assert_eq!(rotated.refresh_token.as_deref(), Some("1//rotated"));
        assert!(rotated.expires_at.is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TokenStorage::new(dir.path().join("nested").join("tokens.json"));

        storage.save(&sample()).unwrap();
        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded, sample_with_times(&loaded));
        assert!(!storage.path().with_extension("json.tmp").exists());
    }

    fn sample_with_times(loaded: &TokenInfo) -> TokenInfo {
        TokenInfo {
            expires_at: loaded.expires_at,
            last_refresh: loaded.last_refresh,
            ..sample()
        }
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let storage = TokenStorage::new(dir.path().join("tokens.json"));
        storage.save(&sample()).unwrap();
        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TokenStorage::new(dir.path().join("tokens.json"));
        assert!(storage.load().unwrap().is_none());
        storage.clear().unwrap();
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TokenStorage::new(dir.path().join("tokens.json"));
        storage.save(&sample()).unwrap();
        storage.clear().unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn corrupt_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "{").unwrap();
        let err = TokenStorage::new(&path).load().unwrap_err();
        assert_eq!(err.code(), crate::error::ProviderErrorCode::ConfigurationError);
    }
}
