use crate::dtos::ResourceCalendarDTO;
use serde::{Deserialize, Serialize};

pub mod store_resource_calendar {
    use super::*;

    pub type RequestBody = ResourceCalendarDTO;
    pub type APIResponse = ResourceCalendarDTO;
}

pub mod list_resource_calendars {
    use super::*;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        #[serde(default)]
        pub resource_calendars: Vec<ResourceCalendarDTO>,
    }
}

pub mod delete_resource_calendar {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    pub struct PathParams {
        pub name: String,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct APIResponse {}
}
