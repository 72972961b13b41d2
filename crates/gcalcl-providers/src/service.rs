//! CalendarService trait definition.
//!
//! [`CalendarService`] is the seam between the command handlers and a
//! calendar backend. It covers exactly the remote operations the handlers
//! need: listing calendars and events, batched quick-add and delete,
//! single-event delete and a token check.

use std::future::Future;
use std::pin::Pin;

use gcalcl_core::Event;

use crate::error::ProviderResult;

/// Calendar id addressing the authenticated user's primary calendar.
pub const PRIMARY_CALENDAR: &str = "primary";

/// Default cap on the number of events a query returns.
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// A boxed future for the trait methods, keeping the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Information about a calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInfo {
    /// Calendar identifier used in API paths.
    pub id: String,
    /// Human-readable name of the calendar.
    pub name: String,
    /// Whether this is the user's primary calendar.
    pub is_primary: bool,
    /// IANA timezone of the calendar.
    pub timezone: Option<String>,
}

impl CalendarInfo {
    /// Creates a new CalendarInfo with the given ID and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_primary: false,
            timezone: None,
        }
    }

    /// Builder method to mark as primary.
    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }
}

/// Parameters of an event listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Calendar to query.
    pub calendar_id: String,
    /// Free-text search over titles and content.
    pub text_query: Option<String>,
    /// Lower bound, as given by the user (e.g. `2010-06-01`).
    pub start_min: Option<String>,
    /// Upper bound, as given by the user.
    pub start_max: Option<String>,
    /// Expand recurring series into one entry per instance.
    pub single_events: bool,
    /// Return results ascending by start time.
    pub order_by_start_time: bool,
    /// Maximum number of events to return.
    pub max_results: usize,
}

impl EventQuery {
    /// Creates a query for a calendar with default settings: expanded
    /// recurrences, ascending start time, 100 results.
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            text_query: None,
            start_min: None,
            start_max: None,
            single_events: true,
            order_by_start_time: true,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Builder method to set the full-text query.
    pub fn with_text_query(mut self, query: Option<String>) -> Self {
        self.text_query = query.filter(|q| !q.is_empty());
        self
    }

    /// Builder method to set the date bounds.
    pub fn with_bounds(mut self, start_min: Option<&str>, start_max: Option<&str>) -> Self {
        self.start_min = start_min.map(String::from);
        self.start_max = start_max.map(String::from);
        self
    }

    /// Builder method to toggle recurrence expansion.
    pub fn with_single_events(mut self, single_events: bool) -> Self {
        self.single_events = single_events;
        self
    }

    /// Builder method to set max results.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }
}

/// Reference used to delete an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventRef {
    /// Calendar holding the event.
    pub calendar_id: String,
    /// Event (or series, or instance) id.
    pub event_id: String,
}

impl EventRef {
    /// Creates a reference.
    pub fn new(calendar_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            event_id: event_id.into(),
        }
    }
}

impl From<&Event> for EventRef {
    fn from(event: &Event) -> Self {
        Self::new(&event.calendar_id, &event.id)
    }
}

/// One quick-add insertion inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAddItem {
    /// Client-side correlation id, unique within the batch.
    pub id: String,
    /// Natural-language event description parsed by the server.
    pub text: String,
}

/// One delete inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteItem {
    /// Client-side correlation id, unique within the batch.
    pub id: String,
    /// Event to delete.
    pub target: EventRef,
}

/// Remote calendar operations used by the command handlers.
///
/// Implementations issue one network round trip per call, except for the
/// paginated listings. Calls are awaited one after another by the callers.
pub trait CalendarService: Send + Sync {
    /// Returns the name of this service (e.g. "google").
    fn name(&self) -> &str;

    /// Lists the calendars the user can see.
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>>;

    /// Lists events matching the query.
    fn list_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<Event>>>;

    /// Inserts events from natural-language text in a single batch request.
    ///
    /// Returns the events the server created. Items that fail inside the
    /// batch are skipped.
    fn quick_add_batch(
        &self,
        calendar_id: String,
        items: Vec<QuickAddItem>,
    ) -> BoxFuture<'_, ProviderResult<Vec<Event>>>;

    /// Deletes events in a single batch request.
    fn delete_batch(&self, items: Vec<DeleteItem>) -> BoxFuture<'_, ProviderResult<()>>;

    /// Deletes one event (or a whole series when given a series id).
    fn delete_event(&self, target: EventRef) -> BoxFuture<'_, ProviderResult<()>>;

    /// Verifies the current credentials by listing the primary calendar.
    fn check_token(&self) -> BoxFuture<'_, ProviderResult<()>>;
}
