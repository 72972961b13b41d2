//! Subcommand handlers.

pub mod add;
#[cfg(feature = "google")]
pub mod auth;
pub mod config;
pub mod delete;
pub mod list;

use gcalcl_providers::CalendarService;

use crate::calendar::CalendarCl;
use crate::error::{ClientError, ClientResult};

/// Fails unless the service accepts the stored credentials.
pub async fn require_auth<S: CalendarService>(cl: &CalendarCl<S>) -> ClientResult<()> {
    if cl.is_token_valid().await {
        Ok(())
    } else {
        Err(ClientError::AuthRequired(format!(
            "run 'gcalcl auth {}'",
            cl.service().name()
        )))
    }
}
