use crate::annotation::CustomerAnnotation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single calendar entry as exposed to clients.
///
/// Events come from the upstream calendar provider or from a subscribed
/// read-only feed. A missing `end_time` means the end is unspecified;
/// `full_day` is set when the start was supplied as a date without a clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub calendar_id: String,
    pub summary: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub full_day: bool,
    /// Marks a synthetic free-slot pseudo-event.
    pub is_free: bool,
    pub create_time: Option<DateTime<Utc>>,
    /// Names of virtual resources consumed by this booking.
    pub resources: Vec<String>,
    pub annotation: Option<CustomerAnnotation>,
}

impl CalendarEvent {
    /// Invariant check: an event without an end is fine, otherwise the end
    /// must not precede the start.
    pub fn is_valid(&self) -> bool {
        match self.end_time {
            Some(end) => end >= self.start_time,
            None => true,
        }
    }
}

impl Default for CalendarEvent {
    fn default() -> Self {
        Self {
            id: String::new(),
            calendar_id: String::new(),
            summary: String::new(),
            description: String::new(),
            start_time: DateTime::<Utc>::MIN_UTC,
            end_time: None,
            full_day: false,
            is_free: false,
            create_time: None,
            resources: Vec::new(),
            annotation: None,
        }
    }
}

/// Sorts events by start time, then end time. Events without an end sort
/// before events with one at the same start.
pub fn sort_events(events: &mut [CalendarEvent]) {
    events.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.end_time.cmp(&b.end_time))
    });
}
