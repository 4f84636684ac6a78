mod annotation;
mod calendar;
mod change;
mod date;
mod event;
pub mod free_slots;
mod holiday;
mod profile;
mod resource;
mod roster;
mod search;

pub use annotation::{AnnotationError, CustomerAnnotation, ExtraData, CUSTOMER_ANNOTATION_TYPE};
pub use calendar::Calendar;
pub use change::{CalendarChange, CalendarChangeKind};
pub use date::{end_of_day, format_duration, parse_flexible_date, start_of_day, InvalidDate};
pub use event::{sort_events, CalendarEvent};
pub use free_slots::calculate_free_slots;
pub use holiday::{HolidayType, PublicHoliday};
pub use profile::{Profile, UserInfo};
pub use resource::ResourceCalendar;
pub use roster::{PlannedShift, WorkShift};
pub use search::EventSearchOptions;

pub use chrono::Weekday;
pub use chrono_tz::Tz;
