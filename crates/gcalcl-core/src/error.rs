//! Error types for the core crate.

use thiserror::Error;

/// Errors raised while building matchers and formatters from user input.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A title pattern is not a valid regular expression.
    #[error("invalid title pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as given.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },

    /// A style list names a field that does not exist.
    #[error("unknown style field '{0}'")]
    UnknownStyleField(String),

    /// A style list is empty.
    #[error("style list is empty")]
    EmptyStyle,
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
