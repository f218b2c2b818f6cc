//! OAuth token storage and the "get valid token" capability.
//!
//! The calendar client never sees credential files or refresh grants; it
//! asks a [`TokenProvider`] for a bearer token and gets a valid one back.
//! [`RefreshingTokenProvider`] backs that capability with a file-persisted
//! token set and the OAuth refresh-token grant. The interactive consent
//! flow that seeds the file is outside this crate.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calendar::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

use super::config::OAuthCredentials;

/// Google's OAuth 2.0 token endpoint.
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// A persisted OAuth token set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The access token for API requests.
    pub access_token: String,

    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,

    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,

    /// When the tokens were last refreshed.
    pub last_refresh: DateTime<Utc>,
}

impl TokenInfo {
    /// Creates a token set from OAuth response data.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(expiry_with_buffer),
            last_refresh: Utc::now(),
        }
    }

    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            // Tokens without an expiry are assumed valid.
            None => false,
        }
    }

    /// Replaces the access token after a refresh.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expires_in_secs.map(expiry_with_buffer);
        self.last_refresh = Utc::now();
    }
}

/// Expiry instant minus a buffer, so tokens refresh slightly early.
fn expiry_with_buffer(expires_in_secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(expires_in_secs) - Duration::seconds(60)
}

/// File-backed token persistence.
///
/// Tokens are stored as JSON, written via a temp-file rename with 0600
/// permissions on Unix.
#[derive(Debug)]
pub struct TokenStorage {
    path: PathBuf,
    tokens: RwLock<Option<TokenInfo>>,
}

impl TokenStorage {
    /// Creates a storage at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tokens: RwLock::new(None),
        }
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads tokens from disk into memory.
    ///
    /// Returns `Ok(true)` if tokens were loaded, `Ok(false)` if no token
    /// file exists.
    pub fn load(&self) -> ProviderResult<bool> {
        if !self.path.exists() {
            debug!("no token file at {:?}", self.path);
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to read token file: {e}"))
        })?;

        let tokens: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!("failed to parse token file: {e}"))
        })?;

        info!("loaded tokens from {:?}", self.path);
        *self.tokens.write().expect("token lock poisoned") = Some(tokens);
        Ok(true)
    }

    /// Saves the current tokens to disk.
    pub fn save(&self) -> ProviderResult<()> {
        let tokens = self.tokens.read().expect("token lock poisoned");
        let tokens = tokens
            .as_ref()
            .ok_or_else(|| ProviderError::internal("no tokens to save"))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration(format!("failed to create token directory: {e}"))
            })?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| ProviderError::internal(format!("failed to serialize tokens: {e}")))?;

        fs::write(&temp_path, &content).map_err(|e| {
            ProviderError::configuration(format!("failed to write token file: {e}"))
        })?;

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to rename token file: {e}"))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(&self.path, perms);
        }

        debug!("saved tokens to {:?}", self.path);
        Ok(())
    }

    /// Returns a clone of the current tokens, if any.
    pub fn get(&self) -> Option<TokenInfo> {
        self.tokens.read().expect("token lock poisoned").clone()
    }

    /// Sets new tokens and saves them to disk.
    pub fn set(&self, tokens: TokenInfo) -> ProviderResult<()> {
        *self.tokens.write().expect("token lock poisoned") = Some(tokens);
        self.save()
    }

    /// Updates the access token and saves to disk.
    pub fn update_access_token(
        &self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) -> ProviderResult<()> {
        {
            let mut tokens = self.tokens.write().expect("token lock poisoned");
            match tokens.as_mut() {
                Some(t) => t.update_access_token(access_token, expires_in_secs),
                None => return Err(ProviderError::internal("no tokens to update")),
            }
        }
        self.save()
    }
}

/// The credential collaborator: hands out a valid bearer token.
pub trait TokenProvider: Send + Sync {
    /// Returns a currently valid access token, refreshing if needed.
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>>;

    /// Whether usable credentials are present at all.
    fn is_authenticated(&self) -> bool;
}

/// Shape of the OAuth refresh-grant response.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// A [`TokenProvider`] backed by [`TokenStorage`] and the refresh-token
/// grant.
pub struct RefreshingTokenProvider {
    credentials: OAuthCredentials,
    storage: TokenStorage,
    http: reqwest::Client,
}

impl RefreshingTokenProvider {
    /// Creates a provider, loading any persisted tokens.
    pub fn new(
        credentials: OAuthCredentials,
        token_path: impl Into<PathBuf>,
        timeout: std::time::Duration,
    ) -> ProviderResult<Self> {
        let storage = TokenStorage::new(token_path);
        storage.load()?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            credentials,
            storage,
            http,
        })
    }

    /// Exchanges the refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> ProviderResult<String> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("token refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::authentication(format!(
                "token refresh failed ({status}): {body}"
            )));
        }

        let refreshed: RefreshResponse = response.json().await.map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse refresh response: {e}"))
        })?;

        self.storage
            .update_access_token(&refreshed.access_token, refreshed.expires_in)?;
        info!("refreshed Google access token");
        Ok(refreshed.access_token)
    }
}

impl TokenProvider for RefreshingTokenProvider {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move {
            let tokens = self.storage.get().ok_or_else(|| {
                ProviderError::authentication(
                    "not authenticated - no token file; seed it with a consent flow",
                )
            })?;

            if !tokens.is_expired() {
                return Ok(tokens.access_token);
            }

            let refresh_token = tokens.refresh_token.as_deref().ok_or_else(|| {
                ProviderError::authentication("no refresh token - re-authentication required")
            })?;
            self.refresh(refresh_token).await
        })
    }

    fn is_authenticated(&self) -> bool {
        self.storage.get().is_some()
    }
}
