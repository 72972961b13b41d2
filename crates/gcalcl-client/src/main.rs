//! gcalcl CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use gcalcl_client::cli::{Cli, Command, ConfigAction};
use gcalcl_client::commands;
use gcalcl_client::config::ClientConfig;
use gcalcl_client::error::{ClientError, ClientResult};
use gcalcl_core::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Some(ref format) = cli.log_format {
        match format.parse::<TracingOutputFormat>() {
            Ok(format) => tracing_config = tracing_config.with_format(format),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        Command::Auth { provider } => auth(provider, &config, &config_path).await,
        command => calendar(command, &config, &config_path).await,
    }
}

#[cfg(feature = "google")]
async fn auth(
    provider: gcalcl_client::cli::AuthProvider,
    config: &ClientConfig,
    config_path: &std::path::Path,
) -> ClientResult<()> {
    use gcalcl_client::cli::AuthProvider;
    use gcalcl_client::commands::auth::GoogleAuthArgs;

    match provider {
        AuthProvider::Google {
            client_id,
            client_secret,
            credentials_file,
            force,
        } => {
            let args = GoogleAuthArgs {
                client_id,
                client_secret,
                credentials_file,
                force,
            };
            commands::auth::google(args, config, config_path).await
        }
    }
}

#[cfg(not(feature = "google"))]
async fn auth(
    provider: gcalcl_client::cli::AuthProvider,
    _config: &ClientConfig,
    _config_path: &std::path::Path,
) -> ClientResult<()> {
    match provider {}
}

#[cfg(feature = "google")]
async fn calendar(
    command: Command,
    config: &ClientConfig,
    config_path: &std::path::Path,
) -> ClientResult<()> {
    use gcalcl_client::calendar::CalendarCl;
    use gcalcl_client::commands::delete::DeleteArgs;
    use gcalcl_client::prompt::TerminalPrompter;
    use gcalcl_providers::google::GoogleService;

    config.validate()?;
    let service = GoogleService::new(config.google_service_config(config_path)?)?;
    let cl = CalendarCl::new(service, config.policy());
    commands::require_auth(&cl).await?;

    match command {
        Command::List {
            output,
            filter,
            date,
        } => commands::list::list(&cl, config, &output, &filter, date.as_deref()).await,
        Command::Today { output, filter } => {
            commands::list::today(&cl, config, &output, &filter).await
        }
        Command::Add { cal, text } => commands::add::run(&cl, config, &text, cal.as_deref()).await,
        Command::Delete {
            title,
            query,
            date,
            cal,
        } => {
            let args = DeleteArgs {
                title: title.as_deref(),
                query: query.as_deref(),
                date: date.as_deref(),
                cal: cal.as_deref(),
            };
            commands::delete::run(&cl, &args, &mut TerminalPrompter).await
        }
        Command::Auth { .. } | Command::Config { .. } => Ok(()),
    }
}

#[cfg(not(feature = "google"))]
async fn calendar(
    _command: Command,
    _config: &ClientConfig,
    _config_path: &std::path::Path,
) -> ClientResult<()> {
    Err(ClientError::Config(
        "gcalcl was built without a calendar service".to_string(),
    ))
}
