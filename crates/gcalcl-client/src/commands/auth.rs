//! Authentication commands.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use gcalcl_providers::google::{GoogleConfig, GoogleService, OAuthCredentials};

use crate::config::{ClientConfig, GoogleSettings};
use crate::error::{ClientError, ClientResult};

/// Arguments of `gcalcl auth google`.
#[derive(Debug, Clone, Default)]
pub struct GoogleAuthArgs {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub force: bool,
}

/// Runs the Google authorization flow and stores the resulting tokens.
///
/// Credentials given on the command line or through `--credentials-file`
/// are written to the `[google]` section of `config_path` so later commands
/// find them.
pub async fn google(
    args: GoogleAuthArgs,
    config: &ClientConfig,
    config_path: &Path,
) -> ClientResult<()> {
    let (client_id, client_secret, source) = resolve_google_credentials(
        args.client_id,
        args.client_secret,
        args.credentials_file,
        config.google.as_ref(),
    )?;

    let credentials = OAuthCredentials::new(&client_id, &client_secret);
    credentials
        .validate()
        .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;

    let mut service_config = GoogleConfig::new(credentials);
    if let Some(settings) = config.google.as_ref() {
        service_config = settings.apply(service_config);
    }
    let service = GoogleService::new(service_config)?;

    let Some(reason) = authorization_reason(&service, args.force).await else {
        persist_credentials(config_path, &client_id, &client_secret, source);
        println!("Already authenticated with Google Calendar.");
        println!("Use --force to re-authenticate.");
        return Ok(());
    };
    info!("authorizing: {}", reason);
    if reason == SCOPE_MISSING {
        println!("The stored token does not grant calendar write access.");
    }

    println!("A browser window will open to authorize access to Google Calendar.");
    println!("If it does not, open the URL printed below.");
    println!();

    service.authenticate().await?;
    persist_credentials(config_path, &client_id, &client_secret, source);

    info!("Google authentication successful");
    println!("Authentication successful, tokens saved.");
    Ok(())
}

const SCOPE_MISSING: &str = "stored token lacks a required scope";

/// Why the authorization flow has to run, or `None` when the stored tokens
/// can be kept.
///
/// Tokens granted for a narrower scope (such as read-only calendar access)
/// cannot add or delete events, so they are replaced.
async fn authorization_reason(service: &GoogleService, force: bool) -> Option<&'static str> {
    if force {
        Some("re-authentication forced")
    } else if !service.is_authenticated().await {
        Some("no usable token stored")
    } else if service.needs_reauth().await {
        Some(SCOPE_MISSING)
    } else {
        None
    }
}

/// Where the credentials were resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialSource {
    /// `--client-id`/`--client-secret` or `--credentials-file`.
    Cli,
    /// Already in the configuration file.
    Config,
}

fn persist_credentials(path: &Path, client_id: &str, client_secret: &str, source: CredentialSource) {
    if source == CredentialSource::Config {
        return;
    }
    match write_credentials(path, client_id, client_secret) {
        Ok(()) => println!("Credentials saved to {}", path.display()),
        Err(e) => warn!("could not save credentials: {}", e),
    }
}

/// Sets `client_id` and `client_secret` under `[google]`, keeping the rest
/// of the file as written.
fn write_credentials(path: &Path, client_id: &str, client_secret: &str) -> ClientResult<()> {
    let content = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };
    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| ClientError::Config(format!("failed to parse {}: {}", path.display(), e)))?;

    if !doc.contains_key("google") {
        doc["google"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let google = doc["google"].as_table_mut().ok_or_else(|| {
        ClientError::Config(format!("[google] in {} is not a table", path.display()))
    })?;
    google["client_id"] = toml_edit::value(client_id);
    google["client_secret"] = toml_edit::value(client_secret);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, doc.to_string())?;
    Ok(())
}

/// Resolves Google credentials.
///
/// Priority (highest to lowest):
/// 1. `--client-id` + `--client-secret`
/// 2. `--credentials-file` (Google Cloud Console JSON)
/// 3. `[google]` section of the configuration, with secret references
fn resolve_google_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    cli_credentials_file: Option<PathBuf>,
    config_google: Option<&GoogleSettings>,
) -> ClientResult<(String, String, CredentialSource)> {
    if let (Some(id), Some(secret)) = (&cli_client_id, &cli_client_secret) {
        return Ok((id.clone(), secret.clone(), CredentialSource::Cli));
    }

    if let Some(ref path) = cli_credentials_file {
        let creds = OAuthCredentials::from_file(path).map_err(|e| {
            ClientError::Config(format!(
                "failed to load credentials from {}: {}",
                path.display(),
                e
            ))
        })?;
        return Ok((creds.client_id, creds.client_secret, CredentialSource::Cli));
    }

    if let Some(google) = config_google
        && google.client_id.is_some()
        && google.client_secret.is_some()
    {
        let creds = google.resolve_credentials().map_err(|e| {
            ClientError::Config(format!(
                "failed to resolve Google credentials from config: {}",
                e
            ))
        })?;
        return Ok((creds.client_id, creds.client_secret, CredentialSource::Config));
    }

    if cli_client_id.is_some() || cli_client_secret.is_some() {
        return Err(ClientError::Config(
            "both --client-id and --client-secret are required when providing credentials directly"
                .to_string(),
        ));
    }

    Err(ClientError::Config(format!(
        "Google credentials are required. Provide via:\n  \
         - client_id + client_secret in {}\n  \
         - --client-id and --client-secret flags\n  \
         - --credentials-file flag (path to Google Cloud Console JSON)\n  \
         - GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET env vars",
        ClientConfig::default_path().display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcalcl_providers::google::{TokenInfo, TokenStorage};

    fn service_with_tokens(dir: &tempfile::TempDir, scopes: &[&str]) -> GoogleService {
        let path = dir.path().join("tokens.json");
        let tokens = TokenInfo::new(
            "ya29.stored",
            Some("1//refresh".into()),
            Some(3600),
            scopes.iter().map(|s| s.to_string()).collect(),
        );
        TokenStorage::new(&path).save(&tokens).unwrap();
        let config = GoogleConfig::new(OAuthCredentials::new(
            "gcalcl-test.apps.googleusercontent.com",
            "secret",
        ))
        .with_token_path(path);
        GoogleService::new(config).unwrap()
    }

    #[tokio::test]
    async fn read_only_token_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_tokens(
            &dir,
            &["https://www.googleapis.com/auth/calendar.readonly"],
        );
        assert!(service.is_authenticated().await);
        assert_eq!(authorization_reason(&service, false).await, Some(SCOPE_MISSING));
    }

    #[tokio::test]
    async fn write_token_is_kept_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_tokens(&dir, &[GoogleConfig::DEFAULT_SCOPE]);
        assert_eq!(authorization_reason(&service, false).await, None);
        assert!(authorization_reason(&service, true).await.is_some());
    }

    #[tokio::test]
    async fn missing_token_needs_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let config = GoogleConfig::new(OAuthCredentials::new(
            "gcalcl-test.apps.googleusercontent.com",
            "secret",
        ))
        .with_token_path(dir.path().join("tokens.json"));
        let service = GoogleService::new(config).unwrap();
        assert_eq!(
            authorization_reason(&service, false).await,
            Some("no usable token stored")
        );
    }

    fn config_settings() -> GoogleSettings {
        GoogleSettings {
            client_id: Some("config-id.apps.googleusercontent.com".to_string()),
            client_secret: Some("config-secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn cli_flags_win() {
        let (id, secret, source) = resolve_google_credentials(
            Some("cli-id.apps.googleusercontent.com".to_string()),
            Some("cli-secret".to_string()),
            None,
            Some(&config_settings()),
        )
        .unwrap();
        assert_eq!(id, "cli-id.apps.googleusercontent.com");
        assert_eq!(secret, "cli-secret");
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn falls_back_to_config() {
        let (id, secret, source) =
            resolve_google_credentials(None, None, None, Some(&config_settings())).unwrap();
        assert_eq!(id, "config-id.apps.googleusercontent.com");
        assert_eq!(secret, "config-secret");
        assert_eq!(source, CredentialSource::Config);
    }

    #[test]
    fn partial_flags_fail() {
        assert!(
            resolve_google_credentials(
                Some("id.apps.googleusercontent.com".to_string()),
                None,
                None,
                None
            )
            .is_err()
        );
        assert!(resolve_google_credentials(None, Some("secret".to_string()), None, None).is_err());
        assert!(resolve_google_credentials(None, None, None, None).is_err());
    }

    #[test]
    fn credentials_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("creds.json");
        std::fs::write(
            &path,
            r#"{"installed": {"client_id": "file-id.apps.googleusercontent.com", "client_secret": "file-secret"}}"#,
        )
        .unwrap();

        let (id, secret, source) = resolve_google_credentials(None, None, Some(path), None).unwrap();
        assert_eq!(id, "file-id.apps.googleusercontent.com");
        assert_eq!(secret, "file-secret");
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn write_credentials_keeps_other_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "# mine\n[general]\nregex = false\n").unwrap();

        write_credentials(&path, "test.apps.googleusercontent.com", "test-secret").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# mine\n"));
        let reloaded: ClientConfig = toml::from_str(&content).unwrap();
        assert!(!reloaded.general.regex);
        let google = reloaded.google.unwrap();
        assert_eq!(
            google.client_id.as_deref(),
            Some("test.apps.googleusercontent.com")
        );
        assert_eq!(google.client_secret.as_deref(), Some("test-secret"));
    }

    #[test]
    fn write_credentials_creates_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        write_credentials(&path, "new.apps.googleusercontent.com", "s").unwrap();
        let reloaded = ClientConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.google.unwrap().client_secret.as_deref(), Some("s"));
    }
}
