use super::api::{
    CalendarApi, CalendarListResponse, EventsPage, GoogleCalendarListEntry, GoogleEvent,
    GoogleEventAttributes, ListEventsQuery, UpstreamError,
};
use super::auth::AccessTokenProvider;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::error;

const GOOGLE_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// REST client for the hosted calendar provider.
pub struct GoogleCalendarRestApi {
    client: reqwest::Client,
    auth: AccessTokenProvider,
}

impl GoogleCalendarRestApi {
    pub fn new(auth: AccessTokenProvider) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth,
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&GoogleEventAttributes>,
    ) -> Result<T, UpstreamError> {
        let token = self
            .auth
            .access_token()
            .await
            .map_err(|err| UpstreamError::Network(err.to_string()))?;

        let mut req = self
            .client
            .request(method, format!("{}/{}", GOOGLE_API_BASE_URL, path))
            .header("authorization", format!("Bearer {}", token))
            .query(query);

        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req
            .send()
            .await
            .map_err(|err| UpstreamError::Network(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            error!(%status, path, "calendar api request failed");

            return Err(match status {
                StatusCode::GONE => UpstreamError::Gone,
                StatusCode::NOT_FOUND => UpstreamError::NotFound,
                _ => UpstreamError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        if status == StatusCode::NO_CONTENT {
            // DELETE responds without a body
            return serde_json::from_str("null")
                .map_err(|err| UpstreamError::UnexpectedShape(err.to_string()));
        }

        let text = res
            .text()
            .await
            .map_err(|err| UpstreamError::Network(err.to_string()))?;
        if text.is_empty() {
            return serde_json::from_str("null")
                .map_err(|err| UpstreamError::UnexpectedShape(err.to_string()));
        }

        serde_json::from_str(&text).map_err(|err| {
            error!(error = %err, path, "unexpected calendar api response");
            UpstreamError::UnexpectedShape(err.to_string())
        })
    }
}

fn list_query(query: &ListEventsQuery, page_token: Option<&str>) -> Vec<(String, String)> {
    let mut params = Vec::new();

    if let Some(token) = &query.sync_token {
        params.push(("syncToken".to_string(), token.clone()));
    } else {
        if let Some(time_min) = query.time_min {
            params.push(("timeMin".to_string(), time_min.to_rfc3339()));
        }
        if let Some(time_max) = query.time_max {
            params.push(("timeMax".to_string(), time_max.to_rfc3339()));
        }
        params.push(("showDeleted".to_string(), query.show_deleted.to_string()));
        params.push(("singleEvents".to_string(), query.single_events.to_string()));

        if let Some(prop) = &query.shared_extended_property {
            params.push(("sharedExtendedProperty".to_string(), prop.clone()));
        }
        if let Some(text) = &query.text {
            params.push(("q".to_string(), text.clone()));
        }
    }

    if let Some(token) = page_token {
        params.push(("pageToken".to_string(), token.to_string()));
    }

    params
}

#[async_trait::async_trait]
impl CalendarApi for GoogleCalendarRestApi {
    async fn list_calendars(&self) -> Result<Vec<GoogleCalendarListEntry>, UpstreamError> {
        let res: CalendarListResponse = self
            .request(
                Method::GET,
                "users/me/calendarList",
                &[("showHidden".to_string(), "true".to_string())],
                None,
            )
            .await?;

        Ok(res.items)
    }

    async fn list_events_page(
        &self,
        calendar_id: &str,
        query: &ListEventsQuery,
        page_token: Option<&str>,
    ) -> Result<EventsPage, UpstreamError> {
        self.request(
            Method::GET,
            &format!("calendars/{}/events", calendar_id),
            &list_query(query, page_token),
            None,
        )
        .await
    }

    async fn get_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<GoogleEvent, UpstreamError> {
        self.request(
            Method::GET,
            &format!("calendars/{}/events/{}", calendar_id, event_id),
            &[],
            None,
        )
        .await
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        attributes: &GoogleEventAttributes,
    ) -> Result<GoogleEvent, UpstreamError> {
        self.request(
            Method::POST,
            &format!("calendars/{}/events", calendar_id),
            &[],
            Some(attributes),
        )
        .await
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        attributes: &GoogleEventAttributes,
    ) -> Result<GoogleEvent, UpstreamError> {
        self.request(
            Method::PUT,
            &format!("calendars/{}/events/{}", calendar_id, event_id),
            &[],
            Some(attributes),
        )
        .await
    }

    async fn move_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        destination_calendar_id: &str,
    ) -> Result<GoogleEvent, UpstreamError> {
        self.request(
            Method::POST,
            &format!("calendars/{}/events/{}/move", calendar_id, event_id),
            &[(
                "destination".to_string(),
                destination_calendar_id.to_string(),
            )],
            None,
        )
        .await
    }

    async fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), UpstreamError> {
        let _: serde_json::Value = self
            .request(
                Method::DELETE,
                &format!("calendars/{}/events/{}", calendar_id, event_id),
                &[],
                None,
            )
            .await?;

        Ok(())
    }
}
