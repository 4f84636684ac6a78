use calgate_api::shared::directory::Directory;
use calgate_domain::Profile;
use calgate_infra::cache::{Cache, LoaderFn};
use calgate_infra::repos::CalendarFacade;
use calgate_infra::services::events::EventPublisher;
use calgate_infra::services::feeds::{FeedFetcher, FeedRepository};
use calgate_infra::services::google_calendar::api::{
    CalendarApi, EventsPage, GoogleCalendarListEntry, GoogleEvent, GoogleEventAttributes,
    ListEventsQuery, UpstreamError,
};
use calgate_infra::services::google_calendar::GoogleCalendarBackend;
use calgate_infra::{create_test_context, Config, Context, FeedConfig, ISys, RealSys};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// An in-memory upstream good enough for service-level tests: single-page
/// listings, id-assigning inserts and cancellation tombstones.
#[derive(Default)]
pub struct FakeUpstream {
    pub calendars: Mutex<HashMap<String, Vec<GoogleEvent>>>,
    id_counter: AtomicUsize,
}

impl FakeUpstream {
    pub fn with_calendars(ids: &[&str]) -> Self {
        let upstream = Self::default();
        {
            let mut calendars = upstream.calendars.lock().unwrap();
            for id in ids {
                calendars.insert(id.to_string(), Vec::new());
            }
        }
        upstream
    }
}

#[async_trait::async_trait]
impl CalendarApi for FakeUpstream {
    async fn list_calendars(&self) -> Result<Vec<GoogleCalendarListEntry>, UpstreamError> {
        let calendars = self.calendars.lock().unwrap();
        let mut ids: Vec<&String> = calendars.keys().collect();
        ids.sort();

        Ok(ids
            .into_iter()
            .map(|id| GoogleCalendarListEntry {
                id: id.clone(),
                summary: format!("Calendar {}", id),
                time_zone: "Europe/Vienna".into(),
                background_color: "#aabbcc".into(),
                hidden: false,
            })
            .collect())
    }

    async fn list_events_page(
        &self,
        calendar_id: &str,
        query: &ListEventsQuery,
        _page_token: Option<&str>,
    ) -> Result<EventsPage, UpstreamError> {
        let calendars = self.calendars.lock().unwrap();
        let events = calendars.get(calendar_id).cloned().unwrap_or_default();

        let incremental = query.sync_token.is_some();
        let items = events
            .into_iter()
            .filter(|e| incremental || !e.is_cancelled())
            .collect();

        Ok(EventsPage {
            items,
            next_page_token: None,
            next_sync_token: Some("sync-token".into()),
        })
    }

    async fn get_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<GoogleEvent, UpstreamError> {
        let calendars = self.calendars.lock().unwrap();
        calendars
            .get(calendar_id)
            .and_then(|events| events.iter().find(|e| e.id == event_id))
            .filter(|e| !e.is_cancelled())
            .cloned()
            .ok_or(UpstreamError::NotFound)
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        attributes: &GoogleEventAttributes,
    ) -> Result<GoogleEvent, UpstreamError> {
        let id = format!("evt-{}", self.id_counter.fetch_add(1, Ordering::SeqCst));
        let event = GoogleEvent {
            id: id.clone(),
            status: attributes.status.clone(),
            summary: attributes.summary.clone(),
            description: attributes.description.clone(),
            start: Some(attributes.start.clone()),
            end: attributes.end.clone(),
            created: Some(chrono::Utc::now()),
            extended_properties: Some(attributes.extended_properties.clone()),
            ..Default::default()
        };

        self.calendars
            .lock()
            .unwrap()
            .entry(calendar_id.to_string())
            .or_default()
            .push(event.clone());

        Ok(event)
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        attributes: &GoogleEventAttributes,
    ) -> Result<GoogleEvent, UpstreamError> {
        let mut calendars = self.calendars.lock().unwrap();
        let events = calendars
            .get_mut(calendar_id)
            .ok_or(UpstreamError::NotFound)?;
        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(UpstreamError::NotFound)?;

        event.summary = attributes.summary.clone();
        event.description = attributes.description.clone();
        event.start = Some(attributes.start.clone());
        event.end = attributes.end.clone();

        Ok(event.clone())
    }

    async fn move_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        destination_calendar_id: &str,
    ) -> Result<GoogleEvent, UpstreamError> {
        let mut calendars = self.calendars.lock().unwrap();
        let origin = calendars
            .get_mut(calendar_id)
            .ok_or(UpstreamError::NotFound)?;
        let idx = origin
            .iter()
            .position(|e| e.id == event_id)
            .ok_or(UpstreamError::NotFound)?;

        let event = origin.remove(idx);
        calendars
            .entry(destination_calendar_id.to_string())
            .or_default()
            .push(event.clone());

        Ok(event)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), UpstreamError> {
        let mut calendars = self.calendars.lock().unwrap();
        let events = calendars
            .get_mut(calendar_id)
            .ok_or(UpstreamError::NotFound)?;
        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(UpstreamError::NotFound)?;

        event.status = "cancelled".into();
        Ok(())
    }
}

struct NoFeeds;

#[async_trait::async_trait]
impl FeedFetcher for NoFeeds {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        anyhow::bail!("no feed configured for {}", url)
    }
}

pub struct TestApp {
    pub ctx: Context,
    pub directory: Arc<Directory>,
    pub upstream: Arc<FakeUpstream>,
}

/// Wires a context over the fake upstream plus a directory whose profile
/// cache serves the given profiles.
pub async fn spawn_app(
    upstream_calendars: &[&str],
    feeds: &[FeedConfig],
    profiles: Vec<Profile>,
) -> TestApp {
    let upstream = Arc::new(FakeUpstream::with_calendars(upstream_calendars));
    let sys: Arc<dyn ISys> = Arc::new(RealSys {});

    let google = Arc::new(GoogleCalendarBackend::new(
        upstream.clone(),
        EventPublisher::disabled(),
        sys.clone(),
        Vec::new(),
        CancellationToken::new(),
    ));

    let feed_repo = Arc::new(FeedRepository::new(Arc::new(NoFeeds), sys.clone()));
    for feed in feeds {
        feed_repo.add(feed.clone(), false).unwrap();
    }

    let ctx = create_test_context(google.clone(), feed_repo.clone(), sys, Config::default());

    let profiles_cache = Cache::new(
        "profiles",
        Duration::from_secs(300),
        LoaderFn(move || {
            let profiles = profiles.clone();
            async move { Ok::<_, anyhow::Error>(profiles) }
        }),
    );

    let facade: Arc<CalendarFacade> = ctx.facade.clone();
    let calendars_cache = Cache::new(
        "calendars",
        Duration::from_secs(300),
        LoaderFn(move || {
            let facade = facade.clone();
            async move { facade.list_calendars().await.map_err(anyhow::Error::new) }
        }),
    );

    let directory = Arc::new(Directory::new(profiles_cache, calendars_cache));
    directory.start(ctx.shutdown.clone());

    // give the directory caches one load cycle
    tokio::time::sleep(Duration::from_millis(100)).await;

    TestApp {
        ctx,
        directory,
        upstream,
    }
}

pub fn profile_with_calendar(user_id: &str, username: &str, calendar_id: &str) -> Profile {
    let mut extra = serde_json::Map::new();
    extra.insert(
        "calendarID".to_string(),
        serde_json::Value::String(calendar_id.to_string()),
    );

    Profile {
        user: calgate_domain::UserInfo {
            id: user_id.into(),
            username: username.into(),
            extra,
        },
    }
}

pub fn feed_config(name: &str) -> FeedConfig {
    FeedConfig {
        name: name.into(),
        color: "#00ff00".into(),
        urls: Vec::new(),
        hidden: false,
        polling_interval: String::new(),
    }
}
