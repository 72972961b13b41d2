//! Calendar event model.
//!
//! - [`Event`]: an event as returned by the calendar service
//! - [`EventStatus`]: confirmation status
//! - [`partition_for_delete`]: splits unexpanded events into singletons and
//!   recurring series before deletion

use serde::{Deserialize, Serialize};

use crate::time::EventTime;

/// Status of a calendar event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// The event is confirmed.
    #[default]
    Confirmed,
    /// The event is tentatively confirmed.
    Tentative,
    /// The event (or this instance of a series) was cancelled.
    Cancelled,
    /// Any status value the service adds later.
    Other(String),
}

impl EventStatus {
    /// Parses the status string used by the calendar API.
    pub fn from_api(status: &str) -> Self {
        match status {
            "confirmed" => Self::Confirmed,
            "tentative" => Self::Tentative,
            "cancelled" | "canceled" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the status as the calendar API spells it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Tentative => "tentative",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }
}

/// A calendar event.
///
/// Events are owned by the remote calendar; the only mutation this program
/// performs is deleting them through their edit reference
/// (`calendar_id`, `id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier, unique within its calendar.
    pub id: String,
    /// Identifier of the calendar holding the event.
    pub calendar_id: String,
    /// Event title.
    pub title: String,
    /// Start time. Missing for some cancelled instances.
    pub start: Option<EventTime>,
    /// End time.
    pub end: Option<EventTime>,
    /// Location text.
    pub location: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Link to the event in the calendar web UI.
    pub html_link: Option<String>,
    /// Recurrence rules (RRULE, EXRULE, RDATE, EXDATE lines). Empty for
    /// single events and for expanded instances.
    #[serde(default)]
    pub recurrence: Vec<String>,
    /// For an instance of a recurring series, the id of the series.
    pub recurring_event_id: Option<String>,
    /// Event status.
    #[serde(default)]
    pub status: EventStatus,
}

impl Event {
    /// Creates an event with the given id, calendar and title.
    pub fn new(
        id: impl Into<String>,
        calendar_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            title: title.into(),
            start: None,
            end: None,
            location: None,
            description: None,
            html_link: None,
            recurrence: Vec::new(),
            recurring_event_id: None,
            status: EventStatus::Confirmed,
        }
    }

    /// Sets start and end times.
    pub fn with_times(mut self, start: EventTime, end: EventTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Sets the recurrence rules.
    pub fn with_recurrence(mut self, rules: Vec<String>) -> Self {
        self.recurrence = rules;
        self
    }

    /// Marks the event as an instance of the given series.
    pub fn with_recurring_event_id(mut self, series_id: impl Into<String>) -> Self {
        self.recurring_event_id = Some(series_id.into());
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Returns true if this event defines a recurring series.
    pub fn is_recurring(&self) -> bool {
        !self.recurrence.is_empty()
    }

    /// Returns true if this event is an expanded instance of `series_id`.
    pub fn is_instance_of(&self, series_id: &str) -> bool {
        self.recurring_event_id.as_deref() == Some(series_id)
    }

    /// Returns true if the event was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status == EventStatus::Cancelled
    }
}

/// Events split by how they are deleted.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeletePartition {
    /// Non-recurring, non-cancelled events. Deleted in bulk.
    pub singletons: Vec<Event>,
    /// Series definitions. Deleted one by one after asking the user.
    pub recurring: Vec<Event>,
    /// Non-recurring events that are already cancelled. Left alone.
    pub cancelled: Vec<Event>,
}

/// Splits unexpanded events into singletons and recurring series.
///
/// Only singletons are checked for cancellation: a cancelled series still
/// lands in `recurring`.
pub fn partition_for_delete(events: Vec<Event>) -> DeletePartition {
    let mut partition = DeletePartition::default();
    for event in events {
        if event.is_recurring() {
            partition.recurring.push(event);
        } else if event.is_cancelled() {
            partition.cancelled.push(event);
        } else {
            partition.singletons.push(event);
        }
    }
    partition
}
