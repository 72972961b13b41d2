//! `delete`: remove matching events, asking about recurring series.

use tracing::info;

use gcalcl_core::DateRange;
use gcalcl_providers::CalendarService;

use crate::calendar::CalendarCl;
use crate::error::ClientResult;
use crate::prompt::Prompter;

/// Selects the events to delete.
#[derive(Debug, Clone, Default)]
pub struct DeleteArgs<'a> {
    pub title: Option<&'a str>,
    pub query: Option<&'a str>,
    pub date: Option<&'a str>,
    pub cal: Option<&'a str>,
}

/// Deletes the events matching `args`.
///
/// Matching runs on unexpanded events so that a recurring series shows up
/// once, as its definition.
pub async fn run<S: CalendarService>(
    cl: &CalendarCl<S>,
    args: &DeleteArgs<'_>,
    prompter: &mut dyn Prompter,
) -> ClientResult<()> {
    let range = DateRange::parse(args.date);
    let events = cl
        .get_events(&range, args.title, args.query, args.cal, false)
        .await?;
    if events.is_empty() {
        info!("no events to delete in {}", range);
        return Ok(());
    }
    cl.delete_events(events, &range, args.cal, prompter).await
}
