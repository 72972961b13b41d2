//! Command-line client for Google Calendar
//!
//! This crate provides the `gcalcl` binary: argument parsing, configuration,
//! the delete prompts and the handlers behind each subcommand.

pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod prompt;
pub mod secret;

#[cfg(test)]
mod fake;

pub use calendar::{CalendarCl, ServicePolicy};
pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use prompt::{Prompter, TerminalPrompter};
