use crate::dtos::PublicHolidayDTO;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod get_holiday {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        pub year: i32,
        #[serde(default)]
        pub month: Option<u32>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct APIResponse {
        #[serde(default)]
        pub holidays: Vec<PublicHolidayDTO>,
    }
}

pub mod is_holiday {
    use super::*;

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct QueryParams {
        /// Defaults to today.
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub is_holiday: bool,
        pub queried_date: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub holiday: Option<PublicHolidayDTO>,
    }
}

pub mod number_of_work_days {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        pub from: NaiveDate,
        pub to: NaiveDate,
        #[serde(default)]
        pub country: Option<String>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub number_of_work_days: u32,
        pub number_of_weekend_days: u32,
        pub number_of_holidays: u32,
    }
}
