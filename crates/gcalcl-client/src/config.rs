//! Client configuration.
//!
//! All settings live in `~/.config/gcalcl/config.toml`. Every section and key
//! is optional.
//!
//! Credential values (`client_id`, `client_secret`) support secret
//! references, see [`crate::secret`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use gcalcl_core::format::DEFAULT_MISSING_VALUE;
use gcalcl_core::{EntryFormatter, StyleField};
use gcalcl_providers::DEFAULT_MAX_RESULTS;

use crate::calendar::ServicePolicy;
use crate::error::{ClientError, ClientResult};

/// Configuration for the gcalcl client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Matching, prompting and output settings.
    pub general: GeneralSettings,

    /// Listing settings.
    pub calendar: CalendarSettings,

    /// Google Calendar settings.
    #[cfg(feature = "google")]
    pub google: Option<GoogleSettings>,
}

/// `[general]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Treat titles as regular expressions anchored at the start.
    pub regex: bool,
    /// Ask before deleting.
    pub delete_prompt: bool,
    /// Answer assumed when a delete confirmation is left empty.
    pub delete_by_default: bool,
    /// Separator between fields of a listed entry.
    pub delimiter: String,
    /// Shown in place of a field that has no value.
    pub missing_field_value: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            regex: true,
            delete_prompt: true,
            delete_by_default: false,
            delimiter: ",".to_string(),
            missing_field_value: DEFAULT_MISSING_VALUE.to_string(),
        }
    }
}

/// `[calendar]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Default style list for `list` and `today`.
    pub list_style: String,
    /// Cap on the number of events a query returns.
    pub max_results: usize,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            list_style: "title,when".to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults when the file
    /// does not exist.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gcalcl")
    }

    /// Matching and deletion policy handed to [`crate::calendar::CalendarCl`].
    pub fn policy(&self) -> ServicePolicy {
        ServicePolicy {
            regex: self.general.regex,
            delete_prompt: self.general.delete_prompt,
            delete_by_default: self.general.delete_by_default,
            max_results: self.calendar.max_results,
        }
    }

    /// Builds the entry formatter from an optional style and delimiter,
    /// falling back to `list_style` and `delimiter`.
    pub fn formatter(
        &self,
        style: Option<&str>,
        delimiter: Option<&str>,
    ) -> ClientResult<EntryFormatter> {
        let style = style.unwrap_or(&self.calendar.list_style);
        let fields = StyleField::parse_list(style)?;
        let delimiter = delimiter.unwrap_or(&self.general.delimiter);
        Ok(EntryFormatter::new(fields, delimiter)
            .with_missing_value(&self.general.missing_field_value))
    }

    /// Builds the Google service configuration from the `[google]` section
    /// of the file at `path`.
    #[cfg(feature = "google")]
    pub fn google_service_config(
        &self,
        path: &Path,
    ) -> ClientResult<gcalcl_providers::google::GoogleConfig> {
        let settings = self.google.as_ref().ok_or_else(|| {
            ClientError::Config(format!(
                "no [google] section in {}, run 'gcalcl auth google' first",
                path.display()
            ))
        })?;
        settings.to_service_config().map_err(ClientError::Config)
    }

    /// Checks values that only fail when used.
    pub fn validate(&self) -> ClientResult<()> {
        StyleField::parse_list(&self.calendar.list_style).map_err(|e| {
            ClientError::Config(format!("invalid [calendar] list_style: {}", e))
        })?;
        if self.calendar.max_results == 0 {
            return Err(ClientError::Config(
                "[calendar] max_results must be at least 1".to_string(),
            ));
        }
        if self.general.delimiter.is_empty() {
            return Err(ClientError::Config(
                "[general] delimiter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GoogleSettings
// ---------------------------------------------------------------------------

/// `[google]` section.
///
/// Credentials are stored inline and support secret references
/// (`pass::…`, `env::…`).
#[cfg(feature = "google")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleSettings {
    /// OAuth client ID.
    pub client_id: Option<String>,

    /// OAuth client secret.
    pub client_secret: Option<String>,

    /// Where tokens are stored.
    pub token_path: Option<PathBuf>,

    /// HTTP timeout in seconds.
    pub timeout: Option<u64>,
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Builds the service configuration, resolving secret references.
    pub fn to_service_config(&self) -> Result<gcalcl_providers::google::GoogleConfig, String> {
        let credentials = self.resolve_credentials()?;
        credentials.validate().map_err(|e| e.to_string())?;
        Ok(self.apply(gcalcl_providers::google::GoogleConfig::new(credentials)))
    }

    /// Applies the non-credential settings to a service configuration.
    pub fn apply(
        &self,
        mut config: gcalcl_providers::google::GoogleConfig,
    ) -> gcalcl_providers::google::GoogleConfig {
        if let Some(ref path) = self.token_path {
            config = config.with_token_path(path);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(std::time::Duration::from_secs(secs));
        }
        config
    }

    /// Resolves `client_id` and `client_secret`, expanding secret references.
    pub(crate) fn resolve_credentials(
        &self,
    ) -> Result<gcalcl_providers::google::OAuthCredentials, String> {
        let raw_id = self.client_id.as_deref().ok_or_else(|| {
            format!(
                "Google credentials not found. Add to {}:\n  \
                 [google]\n  \
                 client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                 client_secret = \"YOUR_SECRET\"\n\n  \
                 Or run: gcalcl auth google --credentials-file <path>",
                ClientConfig::default_path().display()
            )
        })?;
        let raw_secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| "client_secret is missing from the [google] section".to_string())?;

        let client_id = crate::secret::resolve(raw_id)
            .map_err(|e| format!("failed to resolve client_id: {}", e))?;
        let client_secret = crate::secret::resolve(raw_secret)
            .map_err(|e| format!("failed to resolve client_secret: {}", e))?;

        Ok(gcalcl_providers::google::OAuthCredentials::new(
            client_id,
            client_secret,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert!(config.general.regex);
        assert!(config.general.delete_prompt);
        assert!(!config.general.delete_by_default);
        assert_eq!(config.general.delimiter, ",");
        assert_eq!(config.general.missing_field_value, "N/A");
        assert_eq!(config.calendar.list_style, "title,when");
        assert_eq!(config.calendar.max_results, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections() {
        let config: ClientConfig = toml::from_str(
            r#"
[general]
regex = false
delimiter = " | "

[calendar]
max_results = 25
"#,
        )
        .unwrap();

        assert!(!config.general.regex);
        assert!(config.general.delete_prompt);
        assert_eq!(config.general.delimiter, " | ");
        assert_eq!(config.calendar.list_style, "title,when");

        let policy = config.policy();
        assert!(!policy.regex);
        assert_eq!(policy.max_results, 25);
    }

    #[test]
    fn formatter_prefers_arguments() {
        let config = ClientConfig::default();
        let formatter = config.formatter(Some("title,where"), Some(";")).unwrap();
        assert_eq!(formatter.fields(), &[StyleField::Title, StyleField::Where]);

        let default = config.formatter(None, None).unwrap();
        assert_eq!(default.fields(), &[StyleField::Title, StyleField::When]);

        assert!(config.formatter(Some("title,colour"), None).is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.calendar.list_style = "bogus".into();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.calendar.max_results = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\ndelete_prompt = false\n").unwrap();
        let config = ClientConfig::load_from(&path).unwrap();
        assert!(!config.general.delete_prompt);

        std::fs::write(&path, "[general\n").unwrap();
        assert!(ClientConfig::load_from(&path).is_err());
    }

    #[cfg(feature = "google")]
    #[test]
    fn google_settings() {
        let config: ClientConfig = toml::from_str(
            r#"
[google]
client_id = "gcalcl.apps.googleusercontent.com"
client_secret = "s3cret"
token_path = "/tmp/gcalcl-tokens.json"
timeout = 5
"#,
        )
        .unwrap();

        let service = config.google.unwrap().to_service_config().unwrap();
        assert_eq!(service.credentials.client_secret, "s3cret");
        assert_eq!(service.token_path, PathBuf::from("/tmp/gcalcl-tokens.json"));
        assert_eq!(service.timeout, std::time::Duration::from_secs(5));
    }

    #[cfg(feature = "google")]
    #[test]
    fn missing_google_section_names_the_loaded_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elsewhere.toml");
        std::fs::write(&path, "[general]\nregex = false\n").unwrap();
        let config = ClientConfig::load_from(&path).unwrap();

        let err = config.google_service_config(&path).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        let message = err.to_string();
        assert!(message.contains(&path.display().to_string()));
        assert!(!message.contains(&ClientConfig::default_path().display().to_string()));
    }

    #[cfg(feature = "google")]
    #[test]
    fn google_env_references() {
        unsafe {
            std::env::set_var("_GCALCL_CFG_ID", "env.apps.googleusercontent.com");
            std::env::set_var("_GCALCL_CFG_SECRET", "from-env");
        }
        let settings = GoogleSettings {
            client_id: Some("env::_GCALCL_CFG_ID".into()),
            client_secret: Some("env::_GCALCL_CFG_SECRET".into()),
            ..Default::default()
        };
        let creds = settings.resolve_credentials().unwrap();
        assert_eq!(creds.client_id, "env.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "from-env");
        unsafe {
            std::env::remove_var("_GCALCL_CFG_ID");
            std::env::remove_var("_GCALCL_CFG_SECRET");
        }
    }

    #[cfg(feature = "google")]
    #[test]
    fn google_missing_credentials() {
        let missing_id = GoogleSettings {
            client_secret: Some("s".into()),
            ..Default::default()
        };
        assert!(missing_id.resolve_credentials().unwrap_err().contains("not found"));

        let missing_secret = GoogleSettings {
            client_id: Some("x.apps.googleusercontent.com".into()),
            ..Default::default()
        };
        assert!(
            missing_secret
                .resolve_credentials()
                .unwrap_err()
                .contains("client_secret")
        );
    }
}
