use super::api::{
    GoogleEvent, GoogleEventAttributes, GoogleEventDateTime, GoogleExtendedProperties,
    SHARED_PROP_ANNOTATION, SHARED_PROP_CUSTOMER_ID, SHARED_PROP_RESOURCES,
};
use crate::repos::NewEvent;
use calgate_domain::{CalendarEvent, CustomerAnnotation};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("event with id {0:?} does not have a start time")]
    MissingStart(String),
}

fn date_to_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Converts an upstream event into the domain representation.
///
/// A date-only start marks a full-day event. Annotation and resource
/// payloads ride in shared extended properties; malformed payloads are
/// logged and dropped rather than failing the whole event.
pub fn google_event_to_model(
    calendar_id: &str,
    item: &GoogleEvent,
) -> Result<CalendarEvent, ConvertError> {
    let start = item
        .start
        .as_ref()
        .ok_or_else(|| ConvertError::MissingStart(item.id.clone()))?;

    let (start_time, full_day) = match (start.date_time, start.date) {
        (Some(t), _) => (t, false),
        (None, Some(date)) => (date_to_utc(date), true),
        (None, None) => return Err(ConvertError::MissingStart(item.id.clone())),
    };

    let end_time = if item.end_time_unspecified {
        None
    } else {
        item.end
            .as_ref()
            .and_then(|end| end.date_time.or_else(|| end.date.map(date_to_utc)))
    };

    let mut annotation = None;
    let mut resources = Vec::new();

    if let Some(props) = &item.extended_properties {
        if let Some(raw) = props.shared.get(SHARED_PROP_ANNOTATION) {
            match serde_json::from_str::<CustomerAnnotation>(raw) {
                Ok(parsed) => annotation = Some(parsed),
                Err(err) => {
                    error!(event = %item.id, error = %err, "failed to parse customer annotation")
                }
            }
        }

        if let Some(raw) = props.shared.get(SHARED_PROP_RESOURCES) {
            match serde_json::from_str::<Vec<String>>(raw) {
                Ok(parsed) => resources = parsed,
                Err(err) => {
                    error!(event = %item.id, error = %err, "failed to parse resource names")
                }
            }
        }
    }

    Ok(CalendarEvent {
        id: item.id.clone(),
        calendar_id: calendar_id.to_string(),
        summary: item.summary.trim().to_string(),
        description: item.description.trim().to_string(),
        start_time,
        end_time,
        full_day,
        is_free: false,
        create_time: item.created,
        resources,
        annotation,
    })
}

/// Builds the shared extended properties for a mutation.
pub fn extended_props(
    resources: &[String],
    annotation: Option<&CustomerAnnotation>,
) -> GoogleExtendedProperties {
    let mut shared = HashMap::new();

    if let Some(annotation) = annotation {
        if !annotation.customer_id.is_empty() {
            shared.insert(
                SHARED_PROP_CUSTOMER_ID.to_string(),
                annotation.customer_id.clone(),
            );
        }

        match serde_json::to_string(annotation) {
            Ok(blob) => {
                shared.insert(SHARED_PROP_ANNOTATION.to_string(), blob);
            }
            Err(err) => error!(error = %err, "failed to marshal customer annotation"),
        }
    }

    if !resources.is_empty() {
        match serde_json::to_string(resources) {
            Ok(blob) => {
                shared.insert(SHARED_PROP_RESOURCES.to_string(), blob);
            }
            Err(err) => error!(error = %err, "failed to marshal resource names"),
        }
    }

    GoogleExtendedProperties { shared }
}

impl From<NewEvent> for GoogleEventAttributes {
    fn from(e: NewEvent) -> Self {
        let extended_properties = extended_props(&e.resources, e.annotation.as_ref());

        let (start, end) = match e.duration {
            Some(duration) => (
                GoogleEventDateTime::timed(e.start_time),
                Some(GoogleEventDateTime::timed(e.start_time + duration)),
            ),
            // no duration means full-day: send bare dates so the flag
            // survives an upstream round trip
            None => {
                let date = e.start_time.date_naive();
                (
                    GoogleEventDateTime::all_day(date),
                    Some(GoogleEventDateTime::all_day(date + Duration::days(1))),
                )
            }
        };

        Self {
            summary: e.summary,
            description: e.description,
            start,
            end,
            status: "confirmed".to_string(),
            extended_properties,
        }
    }
}

impl From<&CalendarEvent> for GoogleEventAttributes {
    fn from(e: &CalendarEvent) -> Self {
        let extended_properties = extended_props(&e.resources, e.annotation.as_ref());

        let (start, end) = if e.full_day && e.end_time.is_none() {
            let date = e.start_time.date_naive();
            (
                GoogleEventDateTime::all_day(date),
                Some(GoogleEventDateTime::all_day(date + Duration::days(1))),
            )
        } else {
            (
                GoogleEventDateTime::timed(e.start_time),
                e.end_time.map(GoogleEventDateTime::timed),
            )
        };

        Self {
            summary: e.summary.clone(),
            description: e.description.clone(),
            start,
            end,
            status: "confirmed".to_string(),
            extended_properties,
        }
    }
}
