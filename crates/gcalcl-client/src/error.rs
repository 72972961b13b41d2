//! Client error types.

use std::fmt;

use gcalcl_core::CoreError;
use gcalcl_providers::ProviderError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Calendar service error.
    Provider(ProviderError),
    /// Invalid pattern or style.
    Core(CoreError),
    /// IO error.
    Io(std::io::Error),
    /// Authentication required.
    AuthRequired(String),
    /// Non-numeric answer to the recurring-event menu.
    InvalidSelection(String),
    /// The terminal prompt failed or was cancelled.
    Prompt(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(err) => write!(f, "{}", err),
            Self::Core(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::AuthRequired(msg) => write!(f, "authentication required: {}", msg),
            Self::InvalidSelection(input) => {
                write!(f, "invalid selection {:?}: expected a number from 1 to 4", input)
            }
            Self::Prompt(msg) => write!(f, "prompt failed: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::Core(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<inquire::InquireError> for ClientError {
    fn from(err: inquire::InquireError) -> Self {
        Self::Prompt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_required_message() {
        let err = ClientError::AuthRequired("run 'gcalcl auth google'".into());
        assert_eq!(
            err.to_string(),
            "authentication required: run 'gcalcl auth google'"
        );
    }

    #[test]
    fn provider_errors_keep_their_source() {
        use std::error::Error;
        let err = ClientError::from(ProviderError::not_found("gone"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("not_found"));
    }

    #[test]
    fn invalid_selection_names_the_input() {
        let err = ClientError::InvalidSelection("two".into());
        assert!(err.to_string().contains("\"two\""));
    }
}
