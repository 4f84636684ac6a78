pub mod api;
pub mod auth;
mod event_cache;
mod model;
mod rest_api;
mod singleflight;

pub use event_cache::{EventCache, MutationKind};
pub use model::google_event_to_model;
pub use rest_api::GoogleCalendarRestApi;

use crate::config::Config;
use crate::repos::{CalendarError, CalendarReader, CalendarWriter, NewEvent};
use crate::services::events::EventPublisher;
use crate::system::ISys;
use anyhow::Context as _;
use api::{CalendarApi, ListEventsQuery, UpstreamError, SHARED_PROP_CUSTOMER_ID};
use calgate_domain::{Calendar, CalendarEvent, EventSearchOptions};
use chrono::{DateTime, Utc};
use model::google_event_to_model as to_model;
use singleflight::SingleFlight;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

type LoadKey = (
    String,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// The single point of contact with the hosted calendar provider. Keeps one
/// event cache per calendar and answers reads from it whenever possible.
pub struct GoogleCalendarBackend {
    api: Arc<dyn CalendarApi>,
    publisher: EventPublisher,
    sys: Arc<dyn ISys>,
    ignore_calendars: Vec<String>,
    shutdown: CancellationToken,

    caches: tokio::sync::Mutex<HashMap<String, Arc<EventCache>>>,
    load_group: SingleFlight<LoadKey, Vec<CalendarEvent>, UpstreamError>,
}

impl GoogleCalendarBackend {
    pub fn new(
        api: Arc<dyn CalendarApi>,
        publisher: EventPublisher,
        sys: Arc<dyn ISys>,
        ignore_calendars: Vec<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            api,
            publisher,
            sys,
            ignore_calendars,
            shutdown,
            caches: tokio::sync::Mutex::new(HashMap::new()),
            load_group: SingleFlight::new(),
        }
    }

    /// Builds the backend from the configured credential files and warms up
    /// the per-calendar caches.
    pub async fn from_config(
        cfg: &Config,
        publisher: EventPublisher,
        sys: Arc<dyn ISys>,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Arc<Self>> {
        let credentials = auth::credentials_from_file(&cfg.credentials_file)
            .with_context(|| format!("failed to read credentials file {}", cfg.credentials_file))?;
        let token = auth::token_from_file(&cfg.token_file)
            .with_context(|| format!("failed to read token from {}", cfg.token_file))?;

        let provider = auth::AccessTokenProvider::new(credentials, &cfg.token_file, token);
        let backend = Arc::new(Self::new(
            Arc::new(GoogleCalendarRestApi::new(provider)),
            publisher,
            sys,
            cfg.ignore_calendars.clone(),
            shutdown,
        ));

        // build an event cache for each calendar right away
        if let Err(err) = backend.list_calendars().await {
            error!(error = %err, "failed to start watching calendars");
        }

        Ok(backend)
    }

    /// The cache for `calendar_id`, created (and synced once) on first use.
    pub async fn cache_for(&self, calendar_id: &str) -> Arc<EventCache> {
        let mut caches = self.caches.lock().await;

        if let Some(cache) = caches.get(calendar_id) {
            return cache.clone();
        }

        let cache = EventCache::new(
            calendar_id,
            self.api.clone(),
            self.publisher.clone(),
            self.sys.clone(),
            self.shutdown.clone(),
        )
        .await;

        caches.insert(calendar_id.to_string(), cache.clone());
        debug!(calendar = %calendar_id, "created new event cache");

        cache
    }

    fn should_ignore(&self, calendar_id: &str) -> bool {
        self.ignore_calendars.iter().any(|id| id == calendar_id)
    }

    /// Fetches events directly from the upstream because the cache cannot
    /// serve the query. The listing is capped at the cache window so the two
    /// sources do not overlap; what comes back below the window is injected
    /// into the cache.
    async fn load_events_upstream(
        &self,
        calendar_id: &str,
        search: &EventSearchOptions,
        cache: &EventCache,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let mut query = ListEventsQuery {
            show_deleted: false,
            single_events: true,
            time_min: search.from_time,
            ..Default::default()
        };

        // The listing must stay below the cached window: everything at or
        // above `min_time` is the cache's to serve.
        let upper = match (search.to_time, cache.min_covered_time().await) {
            (Some(to), Some(min_time)) => Some(to.min(min_time)),
            (None, Some(min_time)) => Some(min_time),
            (Some(to), None) => Some(to),
            (None, None) => None,
        };
        query.time_max = upper;

        query.shared_extended_property = search
            .customer_id
            .as_ref()
            .map(|id| format!("{}={}", SHARED_PROP_CUSTOMER_ID, id));
        query.text = search.search_text.clone();

        let key: LoadKey = (
            calendar_id.to_string(),
            search.from_time,
            upper,
            search.event_id.clone(),
            search.customer_id.clone(),
            search.search_text.clone(),
        );

        let api = self.api.clone();
        let calendar_id_owned = calendar_id.to_string();
        let event_id = search.event_id.clone();
        let events = self
            .load_group
            .run(key, async move {
                fetch_all_pages(api, calendar_id_owned, query, event_id).await
            })
            .await
            .map_err(|err| anyhow::Error::new(err).context("failed to fetch events"))?;

        // Unfiltered time queries extend the cached window downwards.
        // Filtered results are subsets and must not widen coverage.
        let unfiltered = search.event_id.is_none()
            && search.customer_id.is_none()
            && search.search_text.is_none();
        if let (Some(from), true) = (search.from_time, unfiltered) {
            cache.append_out_of_window(&events, from).await;

            // The fetched slice only covers the stretch below the old
            // window; answer from the merged cache so resident events at or
            // above it are part of the result too.
            if let Some(merged) = cache.try_read(search).await {
                return Ok(merged);
            }
        }

        Ok(events)
    }
}

async fn fetch_all_pages(
    api: Arc<dyn CalendarApi>,
    calendar_id: String,
    query: ListEventsQuery,
    event_id: Option<String>,
) -> Result<Vec<CalendarEvent>, UpstreamError> {
    let mut events = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = api
            .list_events_page(&calendar_id, &query, page_token.as_deref())
            .await?;

        for item in &page.items {
            let event = match to_model(&calendar_id, item) {
                Ok(event) => event,
                Err(err) => {
                    error!(error = %err, "skipping malformed upstream event");
                    continue;
                }
            };

            // a single-event search can stop at the first hit
            if let Some(wanted) = &event_id {
                if event.id == *wanted {
                    return Ok(vec![event]);
                }
            } else {
                events.push(event);
            }
        }

        match page.next_page_token {
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    Ok(events)
}

#[async_trait::async_trait]
impl CalendarReader for GoogleCalendarBackend {
    async fn list_calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        let entries = self
            .api
            .list_calendars()
            .await
            .map_err(|err| anyhow::Error::new(err).context("failed to retrieve calendar list"))?;

        let mut list = Vec::with_capacity(entries.len());
        for entry in entries {
            if self.should_ignore(&entry.id) {
                continue;
            }

            list.push(Calendar {
                id: entry.id.clone(),
                name: entry.summary,
                timezone: entry.time_zone,
                color: entry.background_color,
                readonly: false,
                hidden: entry.hidden,
            });

            // warm the per-calendar cache right away
            self.cache_for(&entry.id).await;
        }

        Ok(list)
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        search: &EventSearchOptions,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let cache = self.cache_for(calendar_id).await;

        if let Some(events) = cache.try_read(search).await {
            return Ok(events);
        }

        self.load_events_upstream(calendar_id, search, &cache).await
    }

    async fn load_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        ignore_cache: bool,
    ) -> Result<CalendarEvent, CalendarError> {
        if !ignore_cache {
            let cache = self.cache_for(calendar_id).await;
            let search = EventSearchOptions::new().with_event_id(event_id);
            // an id search needs no lower bound to be answerable
            let search = EventSearchOptions {
                from_time: cache.min_covered_time().await,
                ..search
            };

            if let Some(mut events) = cache.try_read(&search).await {
                if events.len() == 1 {
                    if let Some(event) = events.pop() {
                        return Ok(event);
                    }
                }
            }
        }

        match self.api.get_event(calendar_id, event_id).await {
            Ok(item) => Ok(to_model(calendar_id, &item).map_err(anyhow::Error::new)?),
            Err(UpstreamError::NotFound) | Err(UpstreamError::Gone) => Err(CalendarError::NotFound),
            Err(err) => Err(anyhow::Error::new(err)
                .context("failed to load event from upstream")
                .into()),
        }
    }
}

#[async_trait::async_trait]
impl CalendarWriter for GoogleCalendarBackend {
    async fn create_event(
        &self,
        calendar_id: &str,
        event: NewEvent,
    ) -> Result<CalendarEvent, CalendarError> {
        let attributes = event.into();
        let created = self
            .api
            .insert_event(calendar_id, &attributes)
            .await
            .map_err(|err| anyhow::Error::new(err).context("failed to insert event upstream"))?;

        info!(calendar = %calendar_id, event = %created.id, "created event");

        self.cache_for(calendar_id).await.trigger_sync();

        Ok(to_model(calendar_id, &created).map_err(anyhow::Error::new)?)
    }

    async fn update_event(&self, event: CalendarEvent) -> Result<CalendarEvent, CalendarError> {
        let attributes = (&event).into();
        let updated = self
            .api
            .update_event(&event.calendar_id, &event.id, &attributes)
            .await
            .map_err(|err| anyhow::Error::new(err).context("failed to update event upstream"))?;

        self.cache_for(&event.calendar_id).await.trigger_sync();

        Ok(to_model(&event.calendar_id, &updated).map_err(anyhow::Error::new)?)
    }

    async fn move_event(
        &self,
        origin_calendar_id: &str,
        event_id: &str,
        target_calendar_id: &str,
    ) -> Result<CalendarEvent, CalendarError> {
        let moved = self
            .api
            .move_event(origin_calendar_id, event_id, target_calendar_id)
            .await
            .map_err(|err| anyhow::Error::new(err).context("failed to move event upstream"))?;

        // the event is gone from the origin immediately; the target picks it
        // up with its next sync
        self.cache_for(origin_calendar_id)
            .await
            .on_mutation(event_id, MutationKind::MovedAway)
            .await;
        self.cache_for(target_calendar_id).await.trigger_sync();

        Ok(to_model(target_calendar_id, &moved).map_err(anyhow::Error::new)?)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError> {
        self.api
            .delete_event(calendar_id, event_id)
            .await
            .map_err(|err| anyhow::Error::new(err).context("failed to delete event upstream"))?;

        self.cache_for(calendar_id)
            .await
            .on_mutation(event_id, MutationKind::Deleted)
            .await;

        Ok(())
    }
}
