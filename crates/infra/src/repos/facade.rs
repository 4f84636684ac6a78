use super::calendar::{CalendarError, CalendarReader, CalendarWriter};
use crate::services::feeds::FeedRepository;
use crate::services::google_calendar::GoogleCalendarBackend;
use calgate_domain::Calendar;
use std::sync::Arc;

/// Presents the mutable upstream calendars and the read-only subscribed
/// feeds as one addressable set and routes operations to the right backend.
pub struct CalendarFacade {
    google: Arc<GoogleCalendarBackend>,
    feeds: Arc<FeedRepository>,
}

impl CalendarFacade {
    pub fn new(google: Arc<GoogleCalendarBackend>, feeds: Arc<FeedRepository>) -> Self {
        Self { google, feeds }
    }

    /// All calendars from both backends.
    pub async fn list_calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        let mut calendars = self.google.list_calendars().await?;
        calendars.extend(self.feeds.list_calendars().await?);
        Ok(calendars)
    }

    /// Both backends can read; feed names take precedence over upstream IDs.
    pub fn reader_for(&self, calendar_id: &str) -> Arc<dyn CalendarReader> {
        if self.feeds.has(calendar_id) {
            self.feeds.clone()
        } else {
            self.google.clone()
        }
    }

    /// Only upstream calendars are writable.
    pub fn writer_for(&self, calendar_id: &str) -> Result<Arc<dyn CalendarWriter>, CalendarError> {
        if self.feeds.has(calendar_id) {
            return Err(CalendarError::ReadOnly);
        }

        Ok(self.google.clone())
    }
}
