use calgate_domain::{Calendar, CalendarEvent, CustomerAnnotation, EventSearchOptions};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("event not found")]
    NotFound,
    #[error("calendar is readonly")]
    ReadOnly,
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Attributes of an event to be created. An absent `duration` means the
/// event is a full-day event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub summary: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub duration: Option<Duration>,
    pub resources: Vec<String>,
    pub annotation: Option<CustomerAnnotation>,
}

/// Read access to a calendar source.
#[async_trait::async_trait]
pub trait CalendarReader: Send + Sync {
    async fn list_calendars(&self) -> Result<Vec<Calendar>, CalendarError>;

    async fn list_events(
        &self,
        calendar_id: &str,
        opts: &EventSearchOptions,
    ) -> Result<Vec<CalendarEvent>, CalendarError>;

    async fn load_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        ignore_cache: bool,
    ) -> Result<CalendarEvent, CalendarError>;
}

/// Write access to a calendar source. Only the upstream backend implements
/// this; subscribed feeds are read-only.
#[async_trait::async_trait]
pub trait CalendarWriter: Send + Sync {
    async fn create_event(
        &self,
        calendar_id: &str,
        event: NewEvent,
    ) -> Result<CalendarEvent, CalendarError>;

    async fn update_event(&self, event: CalendarEvent) -> Result<CalendarEvent, CalendarError>;

    async fn move_event(
        &self,
        origin_calendar_id: &str,
        event_id: &str,
        target_calendar_id: &str,
    ) -> Result<CalendarEvent, CalendarError>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError>;
}
