//! Client configuration file.
//!
//! Read from `~/.config/meetwise/config.toml` (or `--config`). Everything
//! is optional; a missing file yields defaults, and the daemon falls back
//! to its stand-in collaborators for anything not configured.
//!
//! ```toml
//! default_timezone = "America/Mexico_City"
//!
//! [google]
//! credentials_file = "/home/user/.config/meetwise/google-credentials.json"
//! calendar_id = "primary"
//!
//! [intent]
//! model = "meta-llama/Llama-3.1-8B-Instruct"
//! ```

use std::path::PathBuf;

use serde::Deserialize;

/// Client/daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// Daemon socket path override.
    #[serde(default)]
    pub socket_path: Option<PathBuf>,

    /// IANA timezone assumed when a request names none.
    #[serde(default)]
    pub default_timezone: Option<String>,

    /// Google Calendar settings; absent means no calendar provider.
    #[serde(default)]
    pub google: Option<GoogleSettings>,

    /// Intent parser settings; the API token comes from
    /// `HUGGINGFACE_API_TOKEN`.
    #[serde(default)]
    pub intent: Option<IntentSettings>,
}

/// Google Calendar section of the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleSettings {
    /// Path to the OAuth credentials JSON from the Cloud Console.
    pub credentials_file: PathBuf,

    /// Token file override.
    #[serde(default)]
    pub token_path: Option<PathBuf>,

    /// Calendar to operate on (default "primary").
    #[serde(default)]
    pub calendar_id: Option<String>,
}

/// Intent parser section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentSettings {
    /// Model identifier override.
    #[serde(default)]
    pub model: Option<String>,

    /// Chat-completions endpoint override.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl ClientConfig {
    /// Returns the default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetwise")
            .join("config.toml")
    }

    /// Loads the config from the default path; a missing file is fine.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads the config from an explicit path.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("failed to read {}: {e}", path.as_ref().display()))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse {}: {e}", path.as_ref().display()))
    }
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Builds the provider configuration, reading the credentials file.
    pub fn to_provider_config(
        &self,
    ) -> Result<meetwise_providers::google::GoogleConfig, String> {
        use meetwise_providers::google::{GoogleConfig, OAuthCredentials};

        let credentials = OAuthCredentials::from_file(&self.credentials_file)?;
        let mut config = GoogleConfig::new(credentials);
        if let Some(ref token_path) = self.token_path {
            config = config.with_token_path(token_path);
        }
        if let Some(ref calendar_id) = self.calendar_id {
            config = config.with_calendar_id(calendar_id);
        }
        Ok(config)
    }
}

#[cfg(feature = "intent")]
impl IntentSettings {
    /// Builds the router configuration; the token comes from the
    /// environment.
    pub fn to_router_config(
        &self,
    ) -> Result<meetwise_providers::intent::RouterConfig, meetwise_providers::ProviderError> {
        let mut config = meetwise_providers::intent::RouterConfig::from_env()?;
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if let Some(ref endpoint) = self.endpoint {
            config.endpoint = endpoint.clone();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_parses() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert!(config.socket_path.is_none());
        assert!(config.google.is_none());
        assert!(config.intent.is_none());
    }

    #[test]
    fn full_config_parses() {
        let config: ClientConfig = toml::from_str(
            r#"
            socket_path = "/run/meetwise.sock"
            default_timezone = "America/Mexico_City"

            [google]
            credentials_file = "/etc/meetwise/credentials.json"
            calendar_id = "team"

            [intent]
            model = "meta-llama/Llama-3.1-8B-Instruct"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.default_timezone.as_deref(),
            Some("America/Mexico_City")
        );
        let google = config.google.unwrap();
        assert_eq!(google.calendar_id.as_deref(), Some("team"));
        assert!(google.token_path.is_none());
        assert_eq!(
            config.intent.unwrap().model.as_deref(),
            Some("meta-llama/Llama-3.1-8B-Instruct")
        );
    }

    #[test]
    fn load_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClientConfig::load_from(dir.path().join("nope.toml"));
        assert!(result.is_err());
    }
}
