use serde::{Deserialize, Serialize};

/// A named virtual resource (a room, a device) that events can book.
///
/// Resource calendars are derived at query time from the events that list
/// the resource; only this description record is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceCalendar {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub color: String,
    pub max_concurrent_use: i64,
}

impl ResourceCalendar {
    /// The name shown to users, falling back to the unique name.
    pub fn display_or_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}
