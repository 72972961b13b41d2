//! Core types: date ranges, events, title matching, entry formatting

pub mod error;
pub mod event;
pub mod filter;
pub mod format;
pub mod range;
pub mod time;
pub mod tracing;

pub use error::{CoreError, CoreResult};
pub use event::{DeletePartition, Event, EventStatus, partition_for_delete};
pub use filter::{TitleMatcher, literal_pattern};
pub use format::{EntryFormatter, StyleField, format_when};
pub use range::{DATE_FORMAT, DateRange};
pub use time::EventTime;
pub use crate::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
