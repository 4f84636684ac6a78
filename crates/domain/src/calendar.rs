use serde::{Deserialize, Serialize};

/// A calendar known to the service, either a mutable upstream calendar or a
/// read-only subscribed feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub id: String,
    pub name: String,
    /// IANA timezone name as reported by the backing source.
    pub timezone: String,
    pub color: String,
    pub readonly: bool,
    /// Hidden calendars are excluded from requests that do not name them
    /// explicitly.
    pub hidden: bool,
}
