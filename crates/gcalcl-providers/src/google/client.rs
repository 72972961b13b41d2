//! Google Calendar API client.
//!
//! Low-level HTTP access to the Calendar API v3: request building, paging,
//! batch transport and conversion of API resources into [`Event`]s. The
//! access token is supplied per call by the owning service.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use gcalcl_core::{DATE_FORMAT, Event, EventStatus, EventTime};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::service::{CalendarInfo, DeleteItem, EventQuery, EventRef, QuickAddItem};

use super::batch::{self, BATCH_URL, BatchRequest, ResponsePart};

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Largest page the events endpoint serves.
const MAX_PAGE_SIZE: usize = 2500;

/// Google Calendar API client.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
}

impl GoogleCalendarClient {
    /// Creates a client with the given request timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
            })?;
        Ok(Self { http_client })
    }

    /// Lists the calendars on the user's calendar list.
    pub async fn list_calendars(&self, token: &str) -> ProviderResult<Vec<CalendarInfo>> {
        let url = format!("{}/users/me/calendarList", CALENDAR_API_BASE);
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http_client.get(&url).bearer_auth(token);
            if let Some(page) = &page_token {
                request = request.query(&[("pageToken", page)]);
            }

            let body = read_success(send(request).await?).await?;
            let page: CalendarListResponse = parse_json(&body)?;
            calendars.extend(page.items.into_iter().map(CalendarInfo::from));

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!("calendar list has {} entries", calendars.len());
        Ok(calendars)
    }

    /// Lists events matching `query`, following pages up to
    /// `query.max_results`.
    pub async fn list_events(&self, token: &str, query: &EventQuery) -> ProviderResult<Vec<Event>> {
        let url = format!("{}/events", calendar_path(CALENDAR_API_BASE, &query.calendar_id));
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        while events.len() < query.max_results {
            let page_size = (query.max_results - events.len()).min(MAX_PAGE_SIZE);
            let mut params = event_list_params(query, page_size);
            if let Some(page) = page_token.take() {
                params.push(("pageToken", page));
            }
            debug!(calendar = %query.calendar_id, ?params, "listing events");

            let request = self.http_client.get(&url).bearer_auth(token).query(&params);
            let body = read_success(send(request).await?).await?;
            let page: EventListResponse = parse_json(&body)?;

            events.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| convert_event(item, &query.calendar_id)),
            );

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        events.truncate(query.max_results);
        debug!("fetched {} events from calendar {}", events.len(), query.calendar_id);
        Ok(events)
    }

    /// Sends one batch of quick-add insertions and returns the created events.
    pub async fn quick_add_batch(
        &self,
        token: &str,
        calendar_id: &str,
        items: &[QuickAddItem],
    ) -> ProviderResult<Vec<Event>> {
        let mut request = BatchRequest::new();
        for item in items {
            request.post(
                &item.id,
                format!(
                    "{}/events/quickAdd?text={}",
                    calendar_path("", calendar_id),
                    urlencoding::encode(&item.text)
                ),
            );
        }

        let parts = self.execute_batch(token, &request).await?;
        let mut created = Vec::new();
        for part in parts {
            let id = part.content_id.as_deref().unwrap_or("?");
            if !part.is_success() {
                warn!("quick-add {} failed with status {}: {}", id, part.status, part.body);
                continue;
            }
            match serde_json::from_str::<ApiEvent>(&part.body) {
                Ok(api_event) => created.extend(convert_event(api_event, calendar_id)),
                Err(e) => warn!("quick-add {} returned an unreadable event: {}", id, e),
            }
        }
        Ok(created)
    }

    /// Sends one batch of deletes. Fails when any part did not succeed.
    pub async fn delete_batch(&self, token: &str, items: &[DeleteItem]) -> ProviderResult<()> {
        let mut request = BatchRequest::new();
        for item in items {
            request.delete(&item.id, event_path("", &item.target));
        }

        let parts = self.execute_batch(token, &request).await?;
        let failures: Vec<String> = parts
            .iter()
            .filter(|part| !part.is_success())
            .map(|part| {
                format!(
                    "{} ({})",
                    part.content_id.as_deref().unwrap_or("?"),
                    part.status
                )
            })
            .collect();

        if failures.is_empty() {
            debug!("deleted {} events in batch", items.len());
            Ok(())
        } else {
            Err(ProviderError::batch(format!(
                "{} of {} deletes failed: {}",
                failures.len(),
                items.len(),
                failures.join(", ")
            )))
        }
    }

    /// Deletes one event, instance or series.
    pub async fn delete_event(&self, token: &str, target: &EventRef) -> ProviderResult<()> {
        let url = event_path(CALENDAR_API_BASE, target);
        debug!("DELETE {}", url);
        let request = self.http_client.delete(&url).bearer_auth(token);
        read_success(send(request).await?).await?;
        Ok(())
    }

    async fn execute_batch(
        &self,
        token: &str,
        request: &BatchRequest,
    ) -> ProviderResult<Vec<ResponsePart>> {
        if request.is_empty() {
            return Ok(Vec::new());
        }
        debug!("sending batch of {} requests", request.len());

        let http_request = self
            .http_client
            .post(BATCH_URL)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, request.content_type())
            .body(request.body());
        let response = send(http_request).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = read_success(response).await?;

        let parts = batch::parse_response(&content_type, &body)?;
        if parts.len() != request.len() {
            warn!(
                "batch of {} requests returned {} responses",
                request.len(),
                parts.len()
            );
        }
        Ok(parts)
    }
}

async fn send(request: reqwest::RequestBuilder) -> ProviderResult<reqwest::Response> {
    request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::network("request timeout")
        } else if e.is_connect() {
            ProviderError::network(format!("connection failed: {}", e))
        } else {
            ProviderError::network(format!("request failed: {}", e))
        }
    })
}

/// Returns the body of a 2xx response, or the error its status maps to.
async fn read_success(response: reqwest::Response) -> ProviderResult<String> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(ProviderError::from_status(status.as_u16(), &body))
    }
}

fn parse_json<'a, T: Deserialize<'a>>(body: &'a str) -> ProviderResult<T> {
    serde_json::from_str(body)
        .map_err(|e| ProviderError::invalid_response(format!("failed to parse response: {}", e)))
}

fn calendar_path(base: &str, calendar_id: &str) -> String {
    format!("{}/calendars/{}", base, urlencoding::encode(calendar_id))
}

fn event_path(base: &str, target: &EventRef) -> String {
    format!(
        "{}/events/{}",
        calendar_path(base, &target.calendar_id),
        urlencoding::encode(&target.event_id)
    )
}

fn event_list_params(query: &EventQuery, page_size: usize) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("singleEvents", query.single_events.to_string()),
        ("maxResults", page_size.to_string()),
    ];
    // The API only accepts startTime ordering on expanded queries.
    if query.single_events && query.order_by_start_time {
        params.push(("orderBy", "startTime".to_string()));
    }
    if let Some(min) = &query.start_min {
        params.push(("timeMin", api_bound(min, &Local)));
    }
    if let Some(max) = &query.start_max {
        params.push(("timeMax", api_bound(max, &Local)));
    }
    if let Some(text) = &query.text_query {
        params.push(("q", text.clone()));
    }
    params
}

/// Turns a user-supplied date bound into the RFC 3339 timestamp the API
/// expects. `YYYY-MM-DD` becomes midnight in `tz`; anything else is sent
/// unchanged.
fn api_bound<Tz: TimeZone>(bound: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    NaiveDate::parse_from_str(bound, DATE_FORMAT)
        .ok()
        .and_then(|date| tz.from_local_datetime(&date.and_time(NaiveTime::MIN)).earliest())
        .map(|midnight| midnight.to_rfc3339())
        .unwrap_or_else(|| bound.to_string())
}

fn convert_event(event: ApiEvent, calendar_id: &str) -> Option<Event> {
    let Some(id) = event.id else {
        warn!("skipping event without id");
        return None;
    };

    Some(Event {
        start: event.start.and_then(|t| t.parse(&id)),
        end: event.end.and_then(|t| t.parse(&id)),
        title: event.summary.unwrap_or_default(),
        calendar_id: calendar_id.to_string(),
        location: event.location,
        description: event.description,
        html_link: event.html_link,
        recurrence: event.recurrence.unwrap_or_default(),
        recurring_event_id: event.recurring_event_id,
        status: event
            .status
            .as_deref()
            .map(EventStatus::from_api)
            .unwrap_or_default(),
        id,
    })
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// An event resource.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    html_link: Option<String>,
    status: Option<String>,
    recurring_event_id: Option<String>,
    recurrence: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

impl ApiEventTime {
    fn parse(self, event_id: &str) -> Option<EventTime> {
        match (self.date_time, self.date) {
            (Some(dt), _) => DateTime::parse_from_rfc3339(&dt)
                .map(|parsed| EventTime::from_utc(parsed.with_timezone(&Utc)))
                .map_err(|e| warn!("event {}: bad dateTime {:?}: {}", event_id, dt, e))
                .ok(),
            (None, Some(date)) => NaiveDate::parse_from_str(&date, DATE_FORMAT)
                .map(EventTime::from_date)
                .map_err(|e| warn!("event {}: bad date {:?}: {}", event_id, date, e))
                .ok(),
            (None, None) => None,
        }
    }
}

/// Response from the calendarList endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
    next_page_token: Option<String>,
}

/// A calendar list entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListEntry {
    id: String,
    summary: Option<String>,
    summary_override: Option<String>,
    #[serde(default)]
    primary: bool,
    time_zone: Option<String>,
}

impl From<CalendarListEntry> for CalendarInfo {
    fn from(entry: CalendarListEntry) -> Self {
        let name = entry
            .summary_override
            .or(entry.summary)
            .unwrap_or_else(|| entry.id.clone());
        CalendarInfo {
            id: entry.id,
            name,
            is_primary: entry.primary,
            timezone: entry.time_zone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn param<'a>(params: &'a [(&str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn date_bounds_become_local_midnight() {
        let tz = FixedOffset::west_opt(4 * 3600).unwrap();
        assert_eq!(api_bound("2010-06-01", &tz), "2010-06-01T00:00:00-04:00");
        assert_eq!(api_bound("2010-06-01", &Utc), "2010-06-01T00:00:00+00:00");
    }

    #[test]
    fn other_bounds_pass_through() {
        assert_eq!(
            api_bound("2010-06-01T09:00:00Z", &Utc),
            "2010-06-01T09:00:00Z"
        );
        assert_eq!(api_bound("tomorrow", &Utc), "tomorrow");
    }

    #[test]
    fn expanded_query_params() {
        let query = EventQuery::new("primary")
            .with_text_query(Some("standup".into()))
            .with_bounds(Some("2010-06-01T00:00:00Z"), Some("2010-06-20T00:00:00Z"));
        let params = event_list_params(&query, 100);

        assert_eq!(param(&params, "singleEvents"), Some("true"));
        assert_eq!(param(&params, "orderBy"), Some("startTime"));
        assert_eq!(param(&params, "maxResults"), Some("100"));
        assert_eq!(param(&params, "timeMin"), Some("2010-06-01T00:00:00Z"));
        assert_eq!(param(&params, "timeMax"), Some("2010-06-20T00:00:00Z"));
        assert_eq!(param(&params, "q"), Some("standup"));
    }

    #[test]
    fn unexpanded_query_is_not_ordered() {
        let query = EventQuery::new("primary").with_single_events(false);
        let params = event_list_params(&query, 10);
        assert_eq!(param(&params, "singleEvents"), Some("false"));
        assert_eq!(param(&params, "orderBy"), None);
        assert_eq!(param(&params, "timeMin"), None);
        assert_eq!(param(&params, "q"), None);
    }

    #[test]
    fn paths_are_encoded() {
        let target = EventRef::new("team#work@group.calendar.google.com", "abc_20100607");
        assert_eq!(
            event_path("", &target),
            "/calendars/team%23work%40group.calendar.google.com/events/abc_20100607"
        );
        assert_eq!(
            calendar_path(CALENDAR_API_BASE, "primary"),
            "https://www.googleapis.com/calendar/v3/calendars/primary"
        );
    }

    #[test]
    fn converts_timed_instance() {
        let json = r#"{
            "id": "abc_20100607T160000Z",
            "summary": "Standup",
            "status": "confirmed",
            "recurringEventId": "abc",
            "start": {"dateTime": "2010-06-07T09:00:00-07:00"},
            "end": {"dateTime": "2010-06-07T09:15:00-07:00"},
            "htmlLink": "https://www.google.com/calendar/event?eid=x"
        }"#;
        let event = convert_event(serde_json::from_str(json).unwrap(), "primary").unwrap();

        assert_eq!(event.id, "abc_20100607T160000Z");
        assert_eq!(event.calendar_id, "primary");
        assert!(event.is_instance_of("abc"));
        assert!(!event.is_recurring());
        assert_eq!(
            event.start,
            Some(EventTime::from_utc(
                Utc.with_ymd_and_hms(2010, 6, 7, 16, 0, 0).unwrap()
            ))
        );
        assert_eq!(event.html_link.as_deref(), Some("https://www.google.com/calendar/event?eid=x"));
    }

    #[test]
    fn converts_all_day_series() {
        let json = r#"{
            "id": "bday",
            "summary": "Birthday",
            "recurrence": ["RRULE:FREQ=YEARLY"],
            "start": {"date": "2010-06-05"},
            "end": {"date": "2010-06-06"}
        }"#;
        let event = convert_event(serde_json::from_str(json).unwrap(), "family").unwrap();
        assert!(event.is_recurring());
        assert_eq!(
            event.start,
            Some(EventTime::from_date(NaiveDate::from_ymd_opt(2010, 6, 5).unwrap()))
        );
        assert_eq!(event.status, EventStatus::Confirmed);
    }

    #[test]
    fn keeps_cancelled_events_without_times() {
        let json = r#"{"id": "gone", "status": "cancelled", "recurringEventId": "abc"}"#;
        let event = convert_event(serde_json::from_str(json).unwrap(), "primary").unwrap();
        assert!(event.is_cancelled());
        assert!(event.start.is_none());
        assert_eq!(event.title, "");
    }

    #[test]
    fn drops_events_without_id() {
        let json = r#"{"summary": "orphan"}"#;
        assert!(convert_event(serde_json::from_str(json).unwrap(), "primary").is_none());
    }

    #[test]
    fn calendar_list_entries() {
        let json = r#"{
            "items": [
                {"id": "me@example.com", "summary": "me@example.com", "primary": true, "timeZone": "Europe/Paris"},
                {"id": "work@group.calendar.google.com", "summary": "Work", "summaryOverride": "Job"},
                {"id": "bare@group.calendar.google.com"}
            ],
            "nextPageToken": "p2"
        }"#;
        let response: CalendarListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.next_page_token.as_deref(), Some("p2"));

        let calendars: Vec<CalendarInfo> =
            response.items.into_iter().map(CalendarInfo::from).collect();
        assert!(calendars[0].is_primary);
        assert_eq!(calendars[0].timezone.as_deref(), Some("Europe/Paris"));
        assert_eq!(calendars[1].name, "Job");
        assert_eq!(calendars[2].name, "bare@group.calendar.google.com");
    }
}
