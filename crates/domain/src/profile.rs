use serde::{Deserialize, Serialize};
use tracing::warn;

/// A user profile as served by the directory peer service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user: UserInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    /// Free-form per-user key/value data maintained by the directory.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Profile {
    /// The calendar assigned to this user via the `calendarID` extra field,
    /// if any.
    pub fn calendar_id(&self) -> Option<String> {
        let value = self.user.extra.get("calendarID")?;
        match value {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::String(_) => None,
            other => {
                warn!(user = %self.user.id, value = %other, "invalid calendarID extra field");
                None
            }
        }
    }
}
