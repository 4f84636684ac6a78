use calgate_domain::{
    Calendar, CalendarEvent, ExtraData, HolidayType, PublicHoliday, ResourceCalendar,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDTO {
    pub id: String,
    pub name: String,
    pub timezone: String,
    pub color: String,
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_virtual_resource: bool,
}

impl CalendarDTO {
    pub fn new(calendar: Calendar, user_id: Option<String>) -> Self {
        Self {
            id: calendar.id,
            name: calendar.name,
            timezone: calendar.timezone,
            color: calendar.color,
            readonly: calendar.readonly,
            user_id,
            is_virtual_resource: false,
        }
    }

    pub fn virtual_resource(resource: &ResourceCalendar) -> Self {
        Self {
            id: resource.name.clone(),
            name: resource.display_or_name().to_string(),
            timezone: "Local".to_string(),
            color: resource.color.clone(),
            readonly: true,
            user_id: None,
            is_virtual_resource: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventDTO {
    pub id: String,
    pub calendar_id: String,
    pub summary: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub full_day: bool,
    pub is_free: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<ExtraData>,
    /// Set on clones listed under a virtual resource calendar.
    #[serde(default)]
    pub virtual_copy: bool,
}

impl CalendarEventDTO {
    pub fn new(event: CalendarEvent) -> Self {
        Self {
            id: event.id,
            calendar_id: event.calendar_id,
            summary: event.summary,
            description: event.description,
            start_time: event.start_time,
            end_time: event.end_time,
            full_day: event.full_day,
            is_free: event.is_free,
            create_time: event.create_time,
            resources: event.resources,
            extra_data: event.annotation.as_ref().map(ExtraData::new),
            virtual_copy: false,
        }
    }

    pub fn virtual_copy(event: &CalendarEvent) -> Self {
        let mut dto = Self::new(event.clone());
        dto.virtual_copy = true;
        dto
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCalendarDTO {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub max_concurrent_use: i64,
}

impl ResourceCalendarDTO {
    pub fn new(resource: ResourceCalendar) -> Self {
        Self {
            name: resource.name,
            display_name: resource.display_name,
            description: resource.description,
            color: resource.color,
            max_concurrent_use: resource.max_concurrent_use,
        }
    }

    pub fn into_domain(self) -> ResourceCalendar {
        ResourceCalendar {
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            color: self.color,
            max_concurrent_use: self.max_concurrent_use,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicHolidayDTO {
    pub date: String,
    pub local_name: String,
    pub name: String,
    pub country_code: String,
    pub fixed: bool,
    pub global: bool,
    #[serde(rename = "type")]
    pub holiday_type: HolidayType,
}

impl PublicHolidayDTO {
    pub fn new(holiday: PublicHoliday) -> Self {
        let holiday_type = holiday.holiday_type();
        Self {
            date: holiday.date,
            local_name: holiday.local_name,
            name: holiday.name,
            country_code: holiday.country_code,
            fixed: holiday.fixed,
            global: holiday.global,
            holiday_type,
        }
    }
}
