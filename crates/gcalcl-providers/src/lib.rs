//! Calendar service abstraction and the Google Calendar backend.
//!
//! - [`CalendarService`]: the remote operations the command handlers need
//! - [`EventQuery`], [`EventRef`], [`QuickAddItem`], [`DeleteItem`]: request
//!   types
//! - [`ProviderError`]: error type for service operations
//! - [`google`]: the Google Calendar implementation
//!
//! # Example
//!
//! ```ignore
//! use gcalcl_providers::{CalendarService, EventQuery, PRIMARY_CALENDAR};
//!
//! async fn upcoming(service: &dyn CalendarService) -> ProviderResult<Vec<Event>> {
//!     let query = EventQuery::new(PRIMARY_CALENDAR).with_bounds(Some("2010-06-01"), None);
//!     service.list_events(query).await
//! }
//! ```

pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod service;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use service::{
    BoxFuture, CalendarInfo, CalendarService, DEFAULT_MAX_RESULTS, DeleteItem, EventQuery,
    EventRef, PRIMARY_CALENDAR, QuickAddItem,
};
