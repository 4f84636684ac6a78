use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single staffed shift as planned by the roster peer service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannedShift {
    pub unique_id: String,
    pub work_shift_id: String,
    pub assigned_user_ids: Vec<String>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// A shift definition; `tags` drive the free-slot ignore list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkShift {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
}

impl WorkShift {
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}
