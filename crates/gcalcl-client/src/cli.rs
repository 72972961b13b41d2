//! Command-line interface definition.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

/// gcalcl - Google Calendar from the command line
#[derive(Debug, Parser)]
#[command(name = "gcalcl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "GCALCL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true, env = "GCALCL_LOG_FORMAT")]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List events
    List {
        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Date or date range: START, START,END, ,END or START,
        #[arg(long)]
        date: Option<String>,
    },

    /// List today's events
    Today {
        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Add events using natural language ("Dinner with Ann tomorrow 7pm")
    Add {
        /// Calendar to add to (default: primary)
        #[arg(long)]
        cal: Option<String>,

        /// One event description per argument
        #[arg(required = true, value_name = "TEXT")]
        text: Vec<String>,
    },

    /// Delete events
    #[command(group(
        ArgGroup::new("selector")
            .args(["title", "query"])
            .required(true)
            .multiple(true)
    ))]
    Delete {
        /// Title of the events to delete
        #[arg(long)]
        title: Option<String>,

        /// Full-text search query
        #[arg(long)]
        query: Option<String>,

        /// Date or date range: START, START,END, ,END or START,
        #[arg(long)]
        date: Option<String>,

        /// Calendar to delete from (default: primary)
        #[arg(long)]
        cal: Option<String>,
    },

    /// Authentication commands
    Auth {
        #[command(subcommand)]
        provider: AuthProvider,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// How listed entries are rendered.
#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Comma-separated fields: title, when, where, url, id, calendar,
    /// status, recurrence, description
    #[arg(value_name = "STYLE")]
    pub style: Option<String>,

    /// Field separator (default: [general] delimiter)
    #[arg(long)]
    pub delimiter: Option<String>,
}

/// Which events are listed.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Only events whose title matches
    #[arg(long)]
    pub title: Option<String>,

    /// Full-text search query
    #[arg(long)]
    pub query: Option<String>,

    /// Calendar name (default: primary)
    #[arg(long)]
    pub cal: Option<String>,
}

/// Authentication providers.
#[derive(Debug, Subcommand)]
pub enum AuthProvider {
    /// Authenticate with Google Calendar
    #[cfg(feature = "google")]
    Google {
        /// OAuth client ID (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_ID")]
        client_id: Option<String>,

        /// OAuth client secret (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
        client_secret: Option<String>,

        /// Path to the OAuth client JSON downloaded from Google Cloud Console
        #[arg(long, env = "GOOGLE_CREDENTIALS_FILE")]
        credentials_file: Option<PathBuf>,

        /// Force re-authentication even if already authenticated
        #[arg(long, short)]
        force: bool,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
