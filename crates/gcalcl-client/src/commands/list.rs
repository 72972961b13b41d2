//! `list` and `today`.

use chrono::Local;

use gcalcl_core::{DateRange, EntryFormatter};
use gcalcl_providers::CalendarService;

use crate::calendar::CalendarCl;
use crate::cli::{FilterArgs, OutputArgs};
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Prints the events in the range given by `date`.
pub async fn list<S: CalendarService>(
    cl: &CalendarCl<S>,
    config: &ClientConfig,
    output: &OutputArgs,
    filter: &FilterArgs,
    date: Option<&str>,
) -> ClientResult<()> {
    let range = DateRange::parse(date);
    print_entries(cl, config, output, filter, &range).await
}

/// Prints the events starting today.
pub async fn today<S: CalendarService>(
    cl: &CalendarCl<S>,
    config: &ClientConfig,
    output: &OutputArgs,
    filter: &FilterArgs,
) -> ClientResult<()> {
    let range = DateRange::today(Local::now());
    print_entries(cl, config, output, filter, &range).await
}

async fn print_entries<S: CalendarService>(
    cl: &CalendarCl<S>,
    config: &ClientConfig,
    output: &OutputArgs,
    filter: &FilterArgs,
    range: &DateRange,
) -> ClientResult<()> {
    let formatter = config.formatter(output.style.as_deref(), output.delimiter.as_deref())?;
    for line in entries(cl, &formatter, filter, range).await? {
        println!("{}", line);
    }
    Ok(())
}

/// Formats every matching instance in `range`, one line per event.
pub(crate) async fn entries<S: CalendarService>(
    cl: &CalendarCl<S>,
    formatter: &EntryFormatter,
    filter: &FilterArgs,
    range: &DateRange,
) -> ClientResult<Vec<String>> {
    let events = cl
        .get_events(
            range,
            filter.title.as_deref(),
            filter.query.as_deref(),
            filter.cal.as_deref(),
            true,
        )
        .await?;
    Ok(events.iter().map(|event| formatter.format(event)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ServicePolicy;
    use crate::fake::FakeService;
    use gcalcl_core::{Event, StyleField};

    #[tokio::test]
    async fn entries_use_style_and_delimiter() {
        let service = FakeService::new(vec![
            Event::new("a", "primary", "Lunch").with_location("Cafe"),
            Event::new("b", "primary", "Gym"),
        ]);
        let cl = CalendarCl::new(service, ServicePolicy::default());
        let formatter = EntryFormatter::new(vec![StyleField::Title, StyleField::Where], " | ");
        let filter = FilterArgs {
            title: Some("Lunch".into()),
            ..Default::default()
        };

        let lines = entries(&cl, &formatter, &filter, &DateRange::new("2010-06-01", None))
            .await
            .unwrap();
        assert_eq!(lines, vec!["Lunch | Cafe"]);
    }

    #[tokio::test]
    async fn missing_fields_use_placeholder() {
        let cl = CalendarCl::new(
            FakeService::new(vec![Event::new("b", "primary", "Gym")]),
            ServicePolicy::default(),
        );
        let formatter = ClientConfig::default()
            .formatter(Some("title,where"), None)
            .unwrap();
        let lines = entries(&cl, &formatter, &FilterArgs::default(), &DateRange::new("", None))
            .await
            .unwrap();
        assert_eq!(lines, vec!["Gym,N/A"]);
    }
}
