use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// https://developers.google.com/calendar/v3/reference/events

/// Shared extended property carrying the customer id, queryable server-side.
pub const SHARED_PROP_CUSTOMER_ID: &str = "calgate.v1.customerId";
/// Shared extended property carrying the full annotation as JSON.
pub const SHARED_PROP_ANNOTATION: &str = "calgate.v1.CustomerAnnotation";
/// Shared extended property carrying the resource name list as JSON.
pub const SHARED_PROP_RESOURCES: &str = "calgate.v1.ResourceNames";

/// Errors of the upstream wire surface. Kept cloneable so in-flight results
/// can be shared between coalesced callers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UpstreamError {
    /// The sync token (or the requested resource) is gone; a full resync is
    /// required.
    #[error("upstream resource is gone")]
    Gone,
    #[error("upstream resource not found")]
    NotFound,
    #[error("upstream api error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("upstream network error: {0}")]
    Network(String),
    #[error("unexpected upstream response: {0}")]
    UnexpectedShape(String),
}

/// A start or end of an upstream event: either a full datetime or a bare
/// date for full-day events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleEventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
}

impl GoogleEventDateTime {
    pub fn timed(t: DateTime<Utc>) -> Self {
        Self {
            date: None,
            date_time: Some(t),
        }
    }

    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            date_time: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleExtendedProperties {
    pub shared: HashMap<String, String>,
}

/// An event as returned by the upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleEvent {
    pub id: String,
    pub status: String,
    pub summary: String,
    pub description: String,
    pub start: Option<GoogleEventDateTime>,
    pub end: Option<GoogleEventDateTime>,
    pub end_time_unspecified: bool,
    pub created: Option<DateTime<Utc>>,
    pub extended_properties: Option<GoogleExtendedProperties>,
}

impl GoogleEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status == "cancelled"
    }
}

/// The writable attributes of an upstream event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventAttributes {
    pub summary: String,
    pub description: String,
    pub start: GoogleEventDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<GoogleEventDateTime>,
    pub status: String,
    pub extended_properties: GoogleExtendedProperties,
}

/// One page of an events listing. A page carries either a continuation
/// token or, on the final page, the next sync token.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventsPage {
    pub items: Vec<GoogleEvent>,
    pub next_page_token: Option<String>,
    pub next_sync_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleCalendarListEntry {
    pub id: String,
    pub summary: String,
    pub time_zone: String,
    pub background_color: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarListResponse {
    pub items: Vec<GoogleCalendarListEntry>,
}

/// Filters for an events listing call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListEventsQuery {
    pub time_min: Option<DateTime<Utc>>,
    pub time_max: Option<DateTime<Utc>>,
    pub sync_token: Option<String>,
    pub show_deleted: bool,
    pub single_events: bool,
    /// `key=value` filter on shared extended properties.
    pub shared_extended_property: Option<String>,
    /// Free-text search.
    pub text: Option<String>,
}

/// The wire surface of the hosted calendar provider. The REST client is the
/// production implementation; tests substitute a scripted fake.
#[async_trait::async_trait]
pub trait CalendarApi: Send + Sync {
    async fn list_calendars(&self) -> Result<Vec<GoogleCalendarListEntry>, UpstreamError>;

    async fn list_events_page(
        &self,
        calendar_id: &str,
        query: &ListEventsQuery,
        page_token: Option<&str>,
    ) -> Result<EventsPage, UpstreamError>;

    async fn get_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<GoogleEvent, UpstreamError>;

    async fn insert_event(
        &self,
        calendar_id: &str,
        attributes: &GoogleEventAttributes,
    ) -> Result<GoogleEvent, UpstreamError>;

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        attributes: &GoogleEventAttributes,
    ) -> Result<GoogleEvent, UpstreamError>;

    async fn move_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        destination_calendar_id: &str,
    ) -> Result<GoogleEvent, UpstreamError>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str)
        -> Result<(), UpstreamError>;
}
