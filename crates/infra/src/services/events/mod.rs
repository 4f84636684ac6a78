use calgate_domain::CalendarChange;
use serde::Serialize;
use tracing::{debug, error};

/// Type name used in the self-describing envelope on the bus.
pub const CALENDAR_CHANGE_TYPE: &str = "calgate.v1.CalendarChangeEvent";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventEnvelope {
    event: EnvelopePayload,
    retained: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopePayload {
    type_url: String,
    value: serde_json::Value,
}

/// Republishes change records onto the external event bus.
///
/// Publication is fire-and-forget: it runs in a detached task, never blocks
/// the calling path, and failures are only logged.
#[derive(Clone)]
pub struct EventPublisher {
    inner: Option<PublisherInner>,
}

#[derive(Clone)]
struct PublisherInner {
    http: reqwest::Client,
    url: String,
}

impl EventPublisher {
    pub fn new(events_service_url: impl Into<String>) -> Self {
        let url = events_service_url.into();
        if url.is_empty() {
            return Self::disabled();
        }

        Self {
            inner: Some(PublisherInner {
                http: reqwest::Client::new(),
                url,
            }),
        }
    }

    /// A publisher that drops everything. Used when no events service is
    /// configured and in tests.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn publish(&self, change: CalendarChange, retained: bool) {
        let Some(inner) = self.inner.clone() else {
            debug!(calendar = %change.calendar_id, "event publisher disabled, dropping change");
            return;
        };

        tokio::spawn(async move {
            let value = match serde_json::to_value(&change) {
                Ok(value) => value,
                Err(err) => {
                    error!(error = %err, "failed to marshal calendar change");
                    return;
                }
            };

            let envelope = EventEnvelope {
                event: EnvelopePayload {
                    type_url: CALENDAR_CHANGE_TYPE.to_string(),
                    value,
                },
                retained,
            };

            let result = inner
                .http
                .post(format!("{}/v1/events", inner.url))
                .json(&envelope)
                .send()
                .await;

            match result {
                Ok(res) if !res.status().is_success() => {
                    error!(status = %res.status(), "failed to publish event");
                }
                Ok(_) => {}
                Err(err) => error!(error = %err, "failed to publish event"),
            }
        });
    }
}
