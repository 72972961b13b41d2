//! Date ranges given on the command line.
//!
//! A range is written as `START`, `START,END`, `,END` or `START,`. Either side
//! may be empty to leave that bound open. The strings are not validated here;
//! the calendar API rejects malformed dates.

use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Date format used for the default start bound and for `today` ranges.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A `(start, end)` pair bounding an event query.
///
/// `start` may be empty, meaning no lower bound. `end` is `None` when there
/// is no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Lower bound, possibly empty.
    pub start: String,
    /// Upper bound.
    pub end: Option<String>,
}

impl DateRange {
    /// Creates a range from explicit bounds.
    pub fn new(start: impl Into<String>, end: Option<String>) -> Self {
        Self {
            start: start.into(),
            end,
        }
    }

    /// Parses a date expression relative to the local current date.
    pub fn parse(input: Option<&str>) -> Self {
        Self::parse_at(input, Local::now().date_naive())
    }

    /// Parses a date expression, using `today` when no bound is given.
    ///
    /// Missing input, an empty string and a lone `","` all mean "from today
    /// onwards".
    pub fn parse_at(input: Option<&str>, today: NaiveDate) -> Self {
        match input {
            Some(date) if !date.is_empty() && date != "," => {
                let (start, end) = date.split_once(',').unwrap_or((date, ""));
                Self {
                    start: start.to_string(),
                    end: (!end.is_empty()).then(|| end.to_string()),
                }
            }
            _ => Self::from_today(today),
        }
    }

    /// Range starting at `today` with no upper bound.
    pub fn from_today(today: NaiveDate) -> Self {
        Self {
            start: today.format(DATE_FORMAT).to_string(),
            end: None,
        }
    }

    /// Range covering `[now, now + 1 day)` at date granularity.
    pub fn today<Tz: TimeZone>(now: DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        let tomorrow = now.clone() + Duration::days(1);
        Self {
            start: now.format(DATE_FORMAT).to_string(),
            end: Some(tomorrow.format(DATE_FORMAT).to_string()),
        }
    }

    /// Range of everything following this range's end.
    ///
    /// The new range starts at the end bound and is open above. A range
    /// without an end bound keeps its own start.
    pub fn following(&self) -> Self {
        let start = self.end.clone().unwrap_or_else(|| self.start.clone());
        Self { start, end: None }
    }

    /// The lower bound, or `None` when open.
    pub fn start_bound(&self) -> Option<&str> {
        (!self.start.is_empty()).then_some(self.start.as_str())
    }

    /// The upper bound, or `None` when open.
    pub fn end_bound(&self) -> Option<&str> {
        self.end.as_deref().filter(|end| !end.is_empty())
    }
}

/// Renders the range back in `START,END` form.
impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end_bound() {
            Some(end) => write!(f, "{},{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2010, 6, day).unwrap()
    }

    #[test]
    fn no_input_starts_today() {
        let range = DateRange::parse_at(None, june(5));
        assert_eq!(range, DateRange::new("2010-06-05", None));
    }

    #[test]
    fn lone_comma_is_same_as_no_input() {
        assert_eq!(
            DateRange::parse_at(Some(","), june(5)),
            DateRange::parse_at(None, june(5))
        );
        assert_eq!(
            DateRange::parse_at(Some(""), june(5)),
            DateRange::new("2010-06-05", None)
        );
    }

    #[test]
    fn full_range() {
        let range = DateRange::parse_at(Some("2010-06-01,2010-06-20"), june(5));
        assert_eq!(range.start, "2010-06-01");
        assert_eq!(range.end.as_deref(), Some("2010-06-20"));
    }

    #[test]
    fn open_end() {
        let range = DateRange::parse_at(Some("2010-06-01,"), june(5));
        assert_eq!(range, DateRange::new("2010-06-01", None));
    }

    #[test]
    fn start_only() {
        let range = DateRange::parse_at(Some("2010-06-01"), june(5));
        assert_eq!(range, DateRange::new("2010-06-01", None));
    }

    #[test]
    fn open_start() {
        let range = DateRange::parse_at(Some(",2010-06-20"), june(5));
        assert_eq!(range.start, "");
        assert_eq!(range.end.as_deref(), Some("2010-06-20"));
        assert_eq!(range.start_bound(), None);
        assert_eq!(range.end_bound(), Some("2010-06-20"));
    }

    #[test]
    fn malformed_dates_pass_through() {
        let range = DateRange::parse_at(Some("next tuesday,whenever"), june(5));
        assert_eq!(range.start, "next tuesday");
        assert_eq!(range.end.as_deref(), Some("whenever"));
    }

    #[test]
    fn only_first_comma_splits() {
        let range = DateRange::parse_at(Some("a,b,c"), june(5));
        assert_eq!(range.start, "a");
        assert_eq!(range.end.as_deref(), Some("b,c"));
    }

    #[test]
    fn today_spans_one_day() {
        let now = Utc.with_ymd_and_hms(2010, 6, 30, 22, 15, 0).unwrap();
        let range = DateRange::today(now);
        assert_eq!(range, DateRange::new("2010-06-30", Some("2010-07-01".into())));
    }

    #[test]
    fn following_anchors_on_end() {
        let range = DateRange::new("2010-06-01", Some("2010-06-20".into()));
        assert_eq!(range.following(), DateRange::new("2010-06-20", None));

        let open = DateRange::new("2010-06-01", None);
        assert_eq!(open.following(), DateRange::new("2010-06-01", None));
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for input in ["2010-06-01,2010-06-20", "2010-06-01", ",2010-06-20"] {
            let range = DateRange::parse_at(Some(input), june(5));
            assert_eq!(range.to_string(), input);
            assert_eq!(DateRange::parse_at(Some(&range.to_string()), june(5)), range);
        }
    }
}
