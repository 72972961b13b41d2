//! Entry formatting for terminal output.
//!
//! Each event is rendered as one line: the fields named in a style list,
//! joined by a delimiter. Style lists come from the command line or from the
//! `list_style` configuration option, e.g. `title,when,where`.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Local, TimeZone};

use crate::error::{CoreError, CoreResult};
use crate::event::Event;
use crate::time::EventTime;

/// Default rendering for fields with no value.
pub const DEFAULT_MISSING_VALUE: &str = "N/A";

/// A field that can appear in a style list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleField {
    /// Event title.
    Title,
    /// Start and end times.
    When,
    /// Location.
    Where,
    /// Link to the event in the calendar web UI.
    Url,
    /// Event id.
    Id,
    /// Calendar id.
    Calendar,
    /// Event status.
    Status,
    /// Recurrence rules.
    Recurrence,
    /// Description.
    Description,
}

impl StyleField {
    /// Parses a comma-separated style list.
    pub fn parse_list(styles: &str) -> CoreResult<Vec<Self>> {
        let fields = styles
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::from_str)
            .collect::<CoreResult<Vec<_>>>()?;

        if fields.is_empty() {
            return Err(CoreError::EmptyStyle);
        }
        Ok(fields)
    }

    /// Returns the name used in style lists.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::When => "when",
            Self::Where => "where",
            Self::Url => "url",
            Self::Id => "id",
            Self::Calendar => "calendar",
            Self::Status => "status",
            Self::Recurrence => "recurrence",
            Self::Description => "description",
        }
    }
}

impl FromStr for StyleField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" | "name" => Ok(Self::Title),
            "when" => Ok(Self::When),
            "where" | "location" => Ok(Self::Where),
            "url" | "link" => Ok(Self::Url),
            "id" => Ok(Self::Id),
            "calendar" => Ok(Self::Calendar),
            "status" => Ok(Self::Status),
            "recurrence" => Ok(Self::Recurrence),
            "description" | "summary" => Ok(Self::Description),
            _ => Err(CoreError::UnknownStyleField(s.to_string())),
        }
    }
}

impl fmt::Display for StyleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders events as delimited lines.
#[derive(Debug, Clone)]
pub struct EntryFormatter {
    fields: Vec<StyleField>,
    delimiter: String,
    missing: String,
}

impl EntryFormatter {
    /// Creates a formatter for the given fields and delimiter.
    pub fn new(fields: Vec<StyleField>, delimiter: impl Into<String>) -> Self {
        Self {
            fields,
            delimiter: delimiter.into(),
            missing: DEFAULT_MISSING_VALUE.to_string(),
        }
    }

    /// Sets the text used for fields with no value.
    pub fn with_missing_value(mut self, missing: impl Into<String>) -> Self {
        self.missing = missing.into();
        self
    }

    /// Returns the configured fields.
    pub fn fields(&self) -> &[StyleField] {
        &self.fields
    }

    /// Formats an event using local time.
    pub fn format(&self, event: &Event) -> String {
        self.format_in(event, &Local)
    }

    /// Formats an event, rendering times in `tz`.
    pub fn format_in<Tz>(&self, event: &Event, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.fields
            .iter()
            .map(|field| {
                field_value(event, *field, tz).unwrap_or_else(|| self.missing.clone())
            })
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }
}

fn field_value<Tz>(event: &Event, field: StyleField, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let non_empty = |s: &Option<String>| s.clone().filter(|v| !v.is_empty());
    match field {
        StyleField::Title => Some(event.title.clone()).filter(|t| !t.is_empty()),
        StyleField::When => format_when(event.start.as_ref(), event.end.as_ref(), tz),
        StyleField::Where => non_empty(&event.location),
        StyleField::Url => non_empty(&event.html_link),
        StyleField::Id => Some(event.id.clone()),
        StyleField::Calendar => Some(event.calendar_id.clone()),
        StyleField::Status => Some(event.status.as_str().to_string()),
        StyleField::Recurrence => {
            (!event.recurrence.is_empty()).then(|| event.recurrence.join(" "))
        }
        StyleField::Description => non_empty(&event.description),
    }
}

/// Renders an event's start/end.
///
/// Timed events render as `YYYY-MM-DD HH:MM - HH:MM`, with the end date
/// repeated when it falls on another day. All-day events render their first
/// and last day; the API end date is exclusive.
pub fn format_when<Tz>(start: Option<&EventTime>, end: Option<&EventTime>, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let start = start?;
    let start_str = render_time(start, tz);

    let Some(end) = end else {
        return Some(start_str);
    };

    match (start, end) {
        (EventTime::AllDay(first), EventTime::AllDay(exclusive_end)) => {
            let last = *exclusive_end - Duration::days(1);
            if last > *first {
                Some(format!("{} - {}", start_str, last.format("%Y-%m-%d")))
            } else {
                Some(start_str)
            }
        }
        (EventTime::DateTime(s), EventTime::DateTime(e)) => {
            let s = s.with_timezone(tz);
            let e = e.with_timezone(tz);
            let end_str = if s.date_naive() == e.date_naive() {
                e.format("%H:%M").to_string()
            } else {
                e.format("%Y-%m-%d %H:%M").to_string()
            };
            Some(format!("{} - {}", start_str, end_str))
        }
        _ => Some(format!("{} - {}", start_str, render_time(end, tz))),
    }
}

fn render_time<Tz>(time: &EventTime, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match time {
        EventTime::DateTime(dt) => dt.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string(),
        EventTime::AllDay(date) => date.format("%Y-%m-%d").to_string(),
    }
}
