//! Calendar operations behind the `list`, `today`, `add` and `delete`
//! commands.
//!
//! [`CalendarCl`] pairs a [`CalendarService`] with the user's matching and
//! deletion policy. Every remote call is awaited before the next one is
//! issued.

use tracing::{debug, info, warn};

use gcalcl_core::{DateRange, Event, TitleMatcher, literal_pattern, partition_for_delete};
use gcalcl_providers::{
    CalendarInfo, CalendarService, DEFAULT_MAX_RESULTS, DeleteItem, EventQuery, EventRef,
    PRIMARY_CALENDAR, QuickAddItem,
};

use crate::error::ClientResult;
use crate::prompt::{self, DeleteChoice, DeleteMenu, Prompter};

/// Matching and deletion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePolicy {
    /// Titles are regular expressions anchored at the start.
    pub regex: bool,
    /// Ask before deleting.
    pub delete_prompt: bool,
    /// Answer assumed for an empty delete confirmation.
    pub delete_by_default: bool,
    /// Cap on the number of events per query.
    pub max_results: usize,
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self {
            regex: true,
            delete_prompt: true,
            delete_by_default: false,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// A calendar service together with the policy applied to it.
pub struct CalendarCl<S> {
    service: S,
    policy: ServicePolicy,
}

impl<S: CalendarService> CalendarCl<S> {
    /// Wraps `service`.
    pub fn new(service: S, policy: ServicePolicy) -> Self {
        Self { service, policy }
    }

    /// The wrapped service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// The active policy.
    pub fn policy(&self) -> &ServicePolicy {
        &self.policy
    }

    /// Finds the first calendar whose name matches `name`.
    pub async fn get_calendar(&self, name: &str) -> ClientResult<Option<CalendarInfo>> {
        let matcher = TitleMatcher::new(Some(name), self.policy.regex)?;
        let mut matches: Vec<CalendarInfo> = self
            .service
            .list_calendars()
            .await?
            .into_iter()
            .filter(|cal| matcher.is_match(&cal.name))
            .collect();

        if matches.len() > 1 {
            let names: Vec<&str> = matches.iter().map(|c| c.name.as_str()).collect();
            warn!(
                "{} calendars match {:?} ({}), using the first",
                matches.len(),
                name,
                names.join(", ")
            );
        }
        Ok((!matches.is_empty()).then(|| matches.swap_remove(0)))
    }

    /// Resolves a calendar name to an id. `None` when a name was given but
    /// no calendar matches; a diagnostic is printed in that case.
    async fn calendar_id(&self, name: Option<&str>) -> ClientResult<Option<String>> {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return Ok(Some(PRIMARY_CALENDAR.to_string()));
        };
        match self.get_calendar(name).await? {
            Some(calendar) => {
                debug!("calendar {:?} resolved to {}", name, calendar.id);
                Ok(Some(calendar.id))
            }
            None => {
                eprintln!("No calendar matching title {}.", name);
                Ok(None)
            }
        }
    }

    /// Lists events in `range`, sorted by start time.
    ///
    /// `title` is matched client-side; `query` is a server-side full-text
    /// search. Recurring series are expanded into instances when
    /// `expand_recurrence` is set.
    pub async fn get_events(
        &self,
        range: &DateRange,
        title: Option<&str>,
        query: Option<&str>,
        calendar: Option<&str>,
        expand_recurrence: bool,
    ) -> ClientResult<Vec<Event>> {
        let matcher = TitleMatcher::new(title, self.policy.regex)?;
        let Some(calendar_id) = self.calendar_id(calendar).await? else {
            return Ok(Vec::new());
        };

        let query = EventQuery::new(calendar_id)
            .with_text_query(query.map(str::to_string))
            .with_bounds(range.start_bound(), range.end_bound())
            .with_single_events(expand_recurrence)
            .with_max_results(self.policy.max_results);

        let mut events: Vec<Event> = self
            .service
            .list_events(query)
            .await?
            .into_iter()
            .filter(|event| matcher.is_match(&event.title))
            .collect();
        events.sort_by(|a, b| (a.start.is_none(), &a.start).cmp(&(b.start.is_none(), &b.start)));
        Ok(events)
    }

    /// Adds one event per text in a single batch.
    ///
    /// Returns `None` when `calendar` names no known calendar.
    pub async fn quick_add_event(
        &self,
        texts: &[String],
        calendar: Option<&str>,
    ) -> ClientResult<Option<Vec<Event>>> {
        let Some(calendar_id) = self.calendar_id(calendar).await? else {
            return Ok(None);
        };
        if texts.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let items = texts
            .iter()
            .enumerate()
            .map(|(i, text)| QuickAddItem {
                id: format!("insert-request{i}"),
                text: text.clone(),
            })
            .collect();
        let created = self.service.quick_add_batch(calendar_id, items).await?;
        info!("added {} of {} events", created.len(), texts.len());
        Ok(Some(created))
    }

    /// Deletes unexpanded `events` matched in `range`.
    ///
    /// Single events are deleted together in one batch. Each recurring
    /// series is handled on its own, following the user's menu choice when
    /// prompting is enabled.
    pub async fn delete_events(
        &self,
        events: Vec<Event>,
        range: &DateRange,
        calendar: Option<&str>,
        prompter: &mut dyn Prompter,
    ) -> ClientResult<()> {
        let partition = partition_for_delete(events);
        if !partition.cancelled.is_empty() {
            debug!("skipping {} cancelled events", partition.cancelled.len());
        }

        let hint = if self.policy.delete_by_default { "(Y/n)" } else { "(y/N)" };
        let mut singletons = Vec::with_capacity(partition.singletons.len());
        for event in partition.singletons {
            if !self.policy.delete_prompt
                || prompt::confirm(
                    prompter,
                    &format!(
                        "Are you SURE you want to delete event \"{}\"? {}",
                        event.title, hint
                    ),
                    self.policy.delete_by_default,
                )?
            {
                singletons.push(event);
            }
        }
        if !singletons.is_empty() {
            let items = singletons
                .iter()
                .enumerate()
                .map(|(i, event)| DeleteItem {
                    id: format!("delete-request{i}"),
                    target: EventRef::from(event),
                })
                .collect();
            self.service.delete_batch(items).await?;
            info!("deleted {} events", singletons.len());
        }

        for series in &partition.recurring {
            let choice = if self.policy.delete_prompt {
                prompt::choose_delete(prompter, &DeleteMenu::new(&series.title, range))?
            } else {
                DeleteChoice::Series
            };

            match choice {
                DeleteChoice::Range => self.delete_instances(series, range, calendar).await?,
                DeleteChoice::Series => {
                    self.service.delete_event(EventRef::from(series)).await?;
                    info!("deleted series {:?}", series.title);
                }
                DeleteChoice::Following => {
                    self.delete_instances(series, &range.following(), calendar)
                        .await?
                }
                DeleteChoice::Abort => debug!("keeping series {:?}", series.title),
            }
        }
        Ok(())
    }

    /// Deletes the instances of `series` that fall in `range`, one request
    /// per instance.
    async fn delete_instances(
        &self,
        series: &Event,
        range: &DateRange,
        calendar: Option<&str>,
    ) -> ClientResult<()> {
        let pattern = literal_pattern(&series.title, self.policy.regex);
        let instances: Vec<Event> = self
            .get_events(range, Some(&pattern), None, calendar, true)
            .await?
            .into_iter()
            .filter(|event| event.is_instance_of(&series.id))
            .collect();

        for instance in &instances {
            self.service.delete_event(EventRef::from(instance)).await?;
        }
        info!(
            "deleted {} instances of {:?} in {}",
            instances.len(),
            series.title,
            range
        );
        Ok(())
    }

    /// Returns true when the stored credentials are accepted.
    pub async fn is_token_valid(&self) -> bool {
        match self.service.check_token().await {
            Ok(()) => true,
            Err(e) => {
                debug!("token check failed: {}", e);
                false
            }
        }
    }
}
