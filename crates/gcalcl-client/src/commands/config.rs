//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Prints the effective configuration.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# {}", path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Checks the configuration, including Google credentials when present.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.validate()?;

    #[cfg(feature = "google")]
    if let Some(ref google) = config.google
        && (google.client_id.is_some() || google.client_secret.is_some())
    {
        let creds = google
            .resolve_credentials()
            .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;
        creds
            .validate()
            .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;
        println!("Google credentials are valid.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Prints the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_defaults() {
        assert!(validate(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn validate_reports_bad_style() {
        let mut config = ClientConfig::default();
        config.calendar.list_style = "title,nope".into();
        assert!(matches!(validate(&config), Err(ClientError::Config(_))));
    }

    #[cfg(feature = "google")]
    #[test]
    fn validate_checks_credentials() {
        let config: ClientConfig =
            toml::from_str("[google]\nclient_id = \"bogus\"\nclient_secret = \"s\"\n").unwrap();
        assert!(validate(&config).is_err());
    }
}
