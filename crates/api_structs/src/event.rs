use crate::dtos::{CalendarDTO, CalendarEventDTO};
use calgate_domain::ExtraData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which derived data a list-events call should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    Events,
    FreeSlots,
    VirtualResources,
}

/// Which calendars a list-events call addresses. Without a source the
/// calendar attached to the authenticated caller's profile is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventSource {
    #[serde(rename_all = "camelCase")]
    Sources {
        #[serde(default)]
        calendar_ids: Vec<String>,
        #[serde(default)]
        user_ids: Vec<String>,
    },
    AllCalendars,
    AllUsers,
}

/// The searched time window: a single day or an explicit range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchTime {
    Date {
        /// `YYYY-MM-DD` or `YYYY/MM/DD`.
        date: String,
    },
    #[serde(rename_all = "camelCase")]
    TimeRange {
        #[serde(default)]
        from: Option<DateTime<Utc>>,
        #[serde(default)]
        to: Option<DateTime<Utc>>,
    },
}

pub mod list_events {
    use super::*;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct RequestBody {
        pub source: Option<EventSource>,
        pub search_time: Option<SearchTime>,
        pub read_mask: Vec<String>,
        pub request_kinds: Vec<RequestKind>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CalendarEventList {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub calendar: Option<CalendarDTO>,
        #[serde(default)]
        pub events: Vec<CalendarEventDTO>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct APIResponse {
        #[serde(default)]
        pub results: Vec<CalendarEventList>,
    }
}

pub mod create_event {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    pub struct PathParams {
        pub calendar_id: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub name: String,
        #[serde(default)]
        pub description: String,
        pub start: DateTime<Utc>,
        /// Absent end marks a full-day event.
        #[serde(default)]
        pub end: Option<DateTime<Utc>>,
        #[serde(default)]
        pub resources: Vec<String>,
        #[serde(default)]
        pub extra_data: Option<ExtraData>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct APIResponse {
        pub event: CalendarEventDTO,
    }
}

pub mod update_event {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    pub struct PathParams {
        pub calendar_id: String,
        pub event_id: String,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct RequestBody {
        pub name: String,
        #[serde(default)]
        pub description: String,
        #[serde(default)]
        pub start: Option<DateTime<Utc>>,
        #[serde(default)]
        pub end: Option<DateTime<Utc>>,
        #[serde(default)]
        pub resources: Vec<String>,
        #[serde(default)]
        pub extra_data: Option<ExtraData>,
        /// Restricts which fields are applied; all known paths when empty.
        #[serde(default)]
        pub update_mask: Vec<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct APIResponse {
        pub event: CalendarEventDTO,
    }
}

pub mod move_event {
    use super::*;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct RequestBody {
        pub event_id: String,
        /// Origin: either a calendar id or a user whose profile names one.
        pub source_calendar_id: Option<String>,
        pub source_user_id: Option<String>,
        /// Target, same addressing.
        pub target_calendar_id: Option<String>,
        pub target_user_id: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct APIResponse {
        pub event: CalendarEventDTO,
    }
}

pub mod delete_event {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    pub struct PathParams {
        pub calendar_id: String,
        pub event_id: String,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct APIResponse {}
}
