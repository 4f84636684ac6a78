use crate::event::CalendarEvent;
use chrono::{DateTime, Utc};
use std::fmt;

/// Filter options for event queries.
///
/// `from_time` is required for a query to be answerable from the event cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSearchOptions {
    pub from_time: Option<DateTime<Utc>>,
    pub to_time: Option<DateTime<Utc>>,
    pub event_id: Option<String>,
    pub customer_id: Option<String>,
    pub search_text: Option<String>,
}

impl EventSearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, t: DateTime<Utc>) -> Self {
        self.from_time = Some(t);
        self
    }

    pub fn to(mut self, t: DateTime<Utc>) -> Self {
        self.to_time = Some(t);
        self
    }

    /// Restricts the search to the local day containing `t`.
    pub fn for_day(self, t: DateTime<Utc>) -> Self {
        let day = crate::date::start_of_day(t);
        let next_day = crate::date::end_of_day(t);
        self.from(day).to(next_day)
    }

    pub fn with_event_id(mut self, id: impl Into<String>) -> Self {
        self.event_id = Some(id.into());
        self
    }

    pub fn with_customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_id = Some(id.into());
        self
    }

    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Whether `event` satisfies every set filter.
    ///
    /// The lower bound compares against the end of the event when there is
    /// one, so events still running at `from_time` match.
    pub fn matches(&self, event: &CalendarEvent) -> bool {
        if let Some(from) = self.from_time {
            let reference = event.end_time.unwrap_or(event.start_time);
            if reference <= from {
                return false;
            }
        }

        if let Some(to) = self.to_time {
            if event.start_time > to {
                return false;
            }
        }

        if let Some(id) = &self.event_id {
            if event.id != *id {
                return false;
            }
        }

        if let Some(customer_id) = &self.customer_id {
            let matches = event
                .annotation
                .as_ref()
                .map(|a| a.customer_id == *customer_id)
                .unwrap_or(false);
            if !matches {
                return false;
            }
        }

        if let Some(text) = &self.search_text {
            let needle = text.to_lowercase();
            if !event.summary.to_lowercase().contains(&needle)
                && !event.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        true
    }
}

impl fmt::Display for EventSearchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(from) = self.from_time {
            parts.push(format!("from={}", from.to_rfc3339()));
        }
        if let Some(to) = self.to_time {
            parts.push(format!("to={}", to.to_rfc3339()));
        }
        if let Some(id) = &self.event_id {
            parts.push(format!("id={}", id));
        }
        if let Some(customer_id) = &self.customer_id {
            parts.push(format!("customer={}", customer_id));
        }
        if let Some(text) = &self.search_text {
            parts.push(format!("text={}", text));
        }
        write!(f, "{}", parts.join(" "))
    }
}
