use crate::dtos::CalendarDTO;
use serde::{Deserialize, Serialize};

pub mod list_calendars {
    use super::*;

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct QueryParams {
        pub include_virtual_resource_calendars: bool,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct APIResponse {
        #[serde(default)]
        pub calendars: Vec<CalendarDTO>,
    }
}
