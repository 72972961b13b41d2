//! In-memory [`CalendarService`] recording every call, for handler tests.

use std::sync::Mutex;

use gcalcl_core::Event;
use gcalcl_providers::{
    BoxFuture, CalendarInfo, CalendarService, DeleteItem, EventQuery, EventRef, ProviderError,
    ProviderResult, QuickAddItem,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListCalendars,
    ListEvents(EventQuery),
    QuickAdd {
        calendar_id: String,
        items: Vec<QuickAddItem>,
    },
    DeleteBatch(Vec<DeleteItem>),
    DeleteEvent(EventRef),
    CheckToken,
}

/// Serves a fixed set of calendars and events.
///
/// Unexpanded listings return singletons and series definitions; expanded
/// listings return singletons and instances.
#[derive(Debug, Default)]
pub struct FakeService {
    pub calendars: Vec<CalendarInfo>,
    pub events: Vec<Event>,
    pub token_error: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeService {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn with_calendars(mut self, calendars: Vec<CalendarInfo>) -> Self {
        self.calendars = calendars;
        self
    }

    pub fn with_token_error(mut self) -> Self {
        self.token_error = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Every event or series reference deleted, in order, batched or not.
    pub fn deleted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .flat_map(|call| match call {
                Call::DeleteBatch(items) => items.into_iter().map(|i| i.target.event_id).collect(),
                Call::DeleteEvent(target) => vec![target.event_id],
                _ => Vec::new(),
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl CalendarService for FakeService {
    fn name(&self) -> &str {
        "fake"
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        self.record(Call::ListCalendars);
        let calendars = self.calendars.clone();
        Box::pin(async move { Ok(calendars) })
    }

    fn list_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        self.record(Call::ListEvents(query.clone()));
        let events = self
            .events
            .iter()
            .filter(|e| e.calendar_id == query.calendar_id)
            .filter(|e| {
                if query.single_events {
                    !e.is_recurring()
                } else {
                    e.recurring_event_id.is_none()
                }
            })
            .take(query.max_results)
            .cloned()
            .collect();
        Box::pin(async move { Ok(events) })
    }

    fn quick_add_batch(
        &self,
        calendar_id: String,
        items: Vec<QuickAddItem>,
    ) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        let created = items
            .iter()
            .enumerate()
            .map(|(i, item)| Event::new(format!("created{i}"), &calendar_id, &item.text))
            .collect();
        self.record(Call::QuickAdd { calendar_id, items });
        Box::pin(async move { Ok(created) })
    }

    fn delete_batch(&self, items: Vec<DeleteItem>) -> BoxFuture<'_, ProviderResult<()>> {
        self.record(Call::DeleteBatch(items));
        Box::pin(async move { Ok(()) })
    }

    fn delete_event(&self, target: EventRef) -> BoxFuture<'_, ProviderResult<()>> {
        self.record(Call::DeleteEvent(target));
        Box::pin(async move { Ok(()) })
    }

    fn check_token(&self) -> BoxFuture<'_, ProviderResult<()>> {
        self.record(Call::CheckToken);
        let failing = self.token_error;
        Box::pin(async move {
            if failing {
                Err(ProviderError::authentication("token revoked"))
            } else {
                Ok(())
            }
        })
    }
}
