pub mod events;
pub mod feeds;
pub mod google_calendar;
pub mod holidays;
pub mod idm;
pub mod roster;
