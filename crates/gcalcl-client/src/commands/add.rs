//! `add`: quick-add events from free text.

use gcalcl_providers::CalendarService;

use crate::calendar::CalendarCl;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Adds one event per text and prints what was created.
pub async fn run<S: CalendarService>(
    cl: &CalendarCl<S>,
    config: &ClientConfig,
    texts: &[String],
    calendar: Option<&str>,
) -> ClientResult<()> {
    let formatter = config.formatter(None, None)?;
    let Some(created) = cl.quick_add_event(texts, calendar).await? else {
        return Ok(());
    };
    if created.len() < texts.len() {
        eprintln!("{} of {} events could not be added.", texts.len() - created.len(), texts.len());
    }
    for event in &created {
        println!("Added: {}", formatter.format(event));
    }
    Ok(())
}
