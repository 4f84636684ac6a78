use crate::event::CalendarEvent;
use serde::{Deserialize, Serialize};

/// A change record republished onto the external event bus whenever the
/// local materialized view of a calendar changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarChange {
    pub calendar_id: String,
    #[serde(flatten)]
    pub kind: CalendarChangeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalendarChangeKind {
    /// The event was created or updated; carries the new state.
    EventChange(CalendarEvent),
    /// The event was deleted; only the id is known.
    DeletedEventId(String),
}

impl CalendarChange {
    pub fn changed(event: CalendarEvent) -> Self {
        Self {
            calendar_id: event.calendar_id.clone(),
            kind: CalendarChangeKind::EventChange(event),
        }
    }

    pub fn deleted(calendar_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            kind: CalendarChangeKind::DeletedEventId(event_id.into()),
        }
    }
}
