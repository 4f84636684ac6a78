use super::api::{CalendarApi, ListEventsQuery, UpstreamError};
use super::model::google_event_to_model;
use crate::services::events::EventPublisher;
use crate::system::ISys;
use calgate_domain::{
    sort_events, CalendarChange, CalendarEvent, EventSearchOptions,
};
use chrono::{DateTime, Months, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Wait time after a successful sync cycle.
const SYNC_INTERVAL: Duration = Duration::from_secs(60);
/// Upper bound for the failure backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(30 * 60);
/// How often the eviction pass runs.
const EVICT_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Below this many cached events eviction is not worth it.
const EVICT_THRESHOLD: usize = 500;

/// The kind of local mutation reported to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Created,
    Updated,
    MovedAway,
    Deleted,
}

struct CacheState {
    events: Vec<CalendarEvent>,
    /// Opaque upstream cursor; empty means the next cycle performs a full
    /// resync.
    sync_token: String,
    /// Lower bound of the covered time window. `None` until the first full
    /// listing (or after a state reset).
    min_time: Option<DateTime<Utc>>,
}

/// An eventually consistent local copy of one upstream calendar.
///
/// A background watch task keeps the copy fresh using resumable sync tokens;
/// a second task bounds memory by evicting events from past days. Readers
/// get snapshot copies under a read lock.
pub struct EventCache {
    calendar_id: String,
    api: Arc<dyn CalendarApi>,
    publisher: EventPublisher,
    sys: Arc<dyn ISys>,

    state: RwLock<CacheState>,
    trigger: mpsc::Sender<()>,
    sync_seq: watch::Sender<u64>,
}

impl EventCache {
    /// Starts the watch and eviction tasks and waits for the first sync to
    /// complete, so a read right after construction sees upstream state.
    pub async fn new(
        calendar_id: impl Into<String>,
        api: Arc<dyn CalendarApi>,
        publisher: EventPublisher,
        sys: Arc<dyn ISys>,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (seq_tx, mut seq_rx) = watch::channel(0u64);

        let cache = Arc::new(Self {
            calendar_id: calendar_id.into(),
            api,
            publisher,
            sys,
            state: RwLock::new(CacheState {
                events: Vec::new(),
                sync_token: String::new(),
                min_time: None,
            }),
            trigger: trigger_tx,
            sync_seq: seq_tx,
        });

        tokio::spawn(cache.clone().watch(trigger_rx, shutdown.clone()));
        tokio::spawn(cache.clone().evict_loop(shutdown));

        while *seq_rx.borrow() == 0 {
            if seq_rx.changed().await.is_err() {
                break;
            }
        }

        cache
    }

    /// Asks for a sync as soon as possible. Rapid calls coalesce into at
    /// most one pending sync; this never blocks.
    pub fn trigger_sync(&self) {
        let _ = self.trigger.try_send(());
    }

    /// A receiver whose value increases once per completed sync cycle.
    pub fn sync_completions(&self) -> watch::Receiver<u64> {
        self.sync_seq.subscribe()
    }

    /// The lower time bound the cache is willing to answer from.
    pub async fn min_covered_time(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.min_time
    }

    /// Returns matching events when the query is answerable from the cache:
    /// the query needs a lower bound at or after `min_time`. `None` means
    /// the caller must fall back to the upstream.
    pub async fn try_read(&self, search: &EventSearchOptions) -> Option<Vec<CalendarEvent>> {
        let from = search.from_time?;

        let state = self.state.read().await;
        let min_time = state.min_time?;
        if from < min_time {
            info!(
                calendar = %self.calendar_id,
                search_from = %from,
                min_time = %min_time,
                "not using cache: search lower bound is before the covered window"
            );
            return None;
        }

        let mut res = Vec::new();
        for event in &state.events {
            if !search.matches(event) {
                continue;
            }

            if search.event_id.is_some() {
                return Some(vec![event.clone()]);
            }
            res.push(event.clone());
        }

        debug!(calendar = %self.calendar_id, count = res.len(), "loaded calendar events from cache");
        Some(res)
    }

    /// Applies a local mutation: removes entries that are known to be gone
    /// and schedules a sync to pick up the authoritative state.
    pub async fn on_mutation(&self, event_id: &str, kind: MutationKind) {
        if matches!(kind, MutationKind::MovedAway | MutationKind::Deleted) {
            let mut state = self.state.write().await;
            remove_event(&mut state.events, event_id);
        }

        self.trigger_sync();
    }

    /// Injects events fetched below the covered window and extends
    /// `min_time` down to `floor`.
    pub async fn append_out_of_window(&self, events: &[CalendarEvent], floor: DateTime<Utc>) {
        let mut state = self.state.write().await;

        for event in events {
            if !state.events.iter().any(|e| e.id == event.id) {
                state.events.push(event.clone());
            }
        }

        state.min_time = match state.min_time {
            Some(current) if current <= floor => Some(current),
            _ => Some(floor),
        };

        sort_events(&mut state.events);
    }

    async fn watch(self: Arc<Self>, mut trigger: mpsc::Receiver<()>, shutdown: CancellationToken) {
        let mut wait = SYNC_INTERVAL;
        loop {
            let success = self.load_events().await;

            wait = if success {
                SYNC_INTERVAL
            } else {
                // consecutive failures back off exponentially
                (wait * 2).min(MAX_BACKOFF)
            };

            self.sync_seq.send_modify(|seq| *seq += 1);

            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(wait) => {}
                _ = trigger.recv() => {}
            }
        }
    }

    async fn load_events(&self) -> bool {
        let mut state = self.state.write().await;

        let mut query = ListEventsQuery::default();
        if state.sync_token.is_empty() {
            state.events.clear();

            // cover everything from one year before today onwards
            let start_of_cache = self.sys.start_of_today() - Months::new(12);
            state.min_time = Some(start_of_cache);

            query.time_min = Some(start_of_cache);
            query.show_deleted = false;
            query.single_events = false;
        } else {
            query.sync_token = Some(state.sync_token.clone());
        }

        let mut updates_processed = 0usize;
        let mut page_token: Option<String> = None;

        loop {
            let page = match self
                .api
                .list_events_page(&self.calendar_id, &query, page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(UpstreamError::Gone) => {
                    // start over without a sync token; report success so the
                    // next tick performs the full resync without backoff
                    state.sync_token.clear();
                    return true;
                }
                Err(err) => {
                    error!(calendar = %self.calendar_id, error = %err, "failed to sync calendar events");
                    return false;
                }
            };

            updates_processed += page.items.len();

            for item in &page.items {
                if item.is_cancelled() {
                    remove_event(&mut state.events, &item.id);
                    self.publisher.publish(
                        CalendarChange::deleted(self.calendar_id.clone(), item.id.clone()),
                        false,
                    );
                    continue;
                }

                let event = match google_event_to_model(&self.calendar_id, item) {
                    Ok(event) => event,
                    Err(err) => {
                        error!(calendar = %self.calendar_id, error = %err, "failed to convert event");
                        continue;
                    }
                };

                replace_or_append(&mut state.events, event.clone());
                self.publisher.publish(CalendarChange::changed(event), false);
            }

            if let Some(next) = page.next_page_token {
                page_token = Some(next);
                continue;
            }

            if let Some(next) = page.next_sync_token {
                state.sync_token = next;
                break;
            }

            // A page must carry one of the two tokens. If it carries
            // neither, the upstream answered something unexpected; clear
            // everything and start over on the next cycle.
            error!(calendar = %self.calendar_id, "unexpected upstream response, starting over");
            state.sync_token.clear();
            state.events.clear();
            state.min_time = None;
            return false;
        }

        if updates_processed > 0 {
            info!(calendar = %self.calendar_id, updates = updates_processed, "processed updates");
        }

        sort_events(&mut state.events);
        true
    }

    async fn evict_loop(self: Arc<Self>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(EVICT_INTERVAL) => {}
            }

            self.evict_once().await;
        }
    }

    /// Drops events that ended before the current local day and advances
    /// `min_time` accordingly. Skipped while the cache is small.
    pub(crate) async fn evict_once(&self) {
        let mut state = self.state.write().await;

        if state.events.len() < EVICT_THRESHOLD {
            return;
        }

        let midnight = self.sys.start_of_today();
        let before = state.events.len();

        state
            .events
            .retain(|event| event.end_time.unwrap_or(event.start_time) >= midnight);
        state.min_time = Some(midnight);

        let evicted = before - state.events.len();
        if evicted > 0 {
            info!(
                calendar = %self.calendar_id,
                evicted,
                remaining = state.events.len(),
                "evicted events from cache"
            );
        }
    }
}

fn remove_event(events: &mut Vec<CalendarEvent>, event_id: &str) -> bool {
    let before = events.len();
    events.retain(|e| e.id != event_id);

    let removed = before != events.len();
    if !removed {
        warn!(event = %event_id, "event to remove was not cached");
    }

    removed
}

fn replace_or_append(events: &mut Vec<CalendarEvent>, event: CalendarEvent) {
    match events.iter_mut().find(|e| e.id == event.id) {
        Some(existing) => *existing = event,
        None => events.push(event),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::services::google_calendar::api::{
        EventsPage, GoogleCalendarListEntry, GoogleEvent, GoogleEventAttributes,
        GoogleEventDateTime,
    };
    use chrono::TimeZone;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    struct FixedSys {
        now: DateTime<Utc>,
        midnight: DateTime<Utc>,
    }

    impl ISys for FixedSys {
        fn now(&self) -> DateTime<Utc> {
            self.now
        }

        fn start_of_today(&self) -> DateTime<Utc> {
            self.midnight
        }
    }

    /// Test clock pinned shortly after the epoch so that the one-year
    /// backfill window starts before every timestamp used in these tests.
    fn test_midnight() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap()
    }

    fn fixed_sys() -> Arc<dyn ISys> {
        Arc::new(FixedSys {
            now: test_midnight() + chrono::Duration::hours(12),
            midnight: test_midnight(),
        })
    }

    fn item(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> GoogleEvent {
        GoogleEvent {
            id: id.into(),
            status: "confirmed".into(),
            summary: id.into(),
            start: Some(GoogleEventDateTime::timed(start)),
            end: Some(GoogleEventDateTime::timed(end)),
            ..Default::default()
        }
    }

    fn cancelled(id: &str) -> GoogleEvent {
        GoogleEvent {
            id: id.into(),
            status: "cancelled".into(),
            ..Default::default()
        }
    }

    fn final_page(items: Vec<GoogleEvent>, sync_token: &str) -> Result<EventsPage, UpstreamError> {
        Ok(EventsPage {
            items,
            next_page_token: None,
            next_sync_token: Some(sync_token.into()),
        })
    }

    /// Scripted upstream: pages are consumed in order; once the script is
    /// drained every further listing is an empty incremental page.
    #[derive(Default)]
    struct ScriptedApi {
        pages: Mutex<VecDeque<Result<EventsPage, UpstreamError>>>,
        list_calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn push(&self, page: Result<EventsPage, UpstreamError>) {
            self.pages.lock().unwrap().push_back(page);
        }
    }

    #[async_trait::async_trait]
    impl CalendarApi for ScriptedApi {
        async fn list_calendars(&self) -> Result<Vec<GoogleCalendarListEntry>, UpstreamError> {
            Ok(Vec::new())
        }

        async fn list_events_page(
            &self,
            _calendar_id: &str,
            _query: &ListEventsQuery,
            _page_token: Option<&str>,
        ) -> Result<EventsPage, UpstreamError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| final_page(Vec::new(), "token-idle"))
        }

        async fn get_event(
            &self,
            _calendar_id: &str,
            _event_id: &str,
        ) -> Result<GoogleEvent, UpstreamError> {
            Err(UpstreamError::NotFound)
        }

        async fn insert_event(
            &self,
            _calendar_id: &str,
            _attributes: &GoogleEventAttributes,
        ) -> Result<GoogleEvent, UpstreamError> {
            Err(UpstreamError::NotFound)
        }

        async fn update_event(
            &self,
            _calendar_id: &str,
            _event_id: &str,
            _attributes: &GoogleEventAttributes,
        ) -> Result<GoogleEvent, UpstreamError> {
            Err(UpstreamError::NotFound)
        }

        async fn move_event(
            &self,
            _calendar_id: &str,
            _event_id: &str,
            _destination_calendar_id: &str,
        ) -> Result<GoogleEvent, UpstreamError> {
            Err(UpstreamError::NotFound)
        }

        async fn delete_event(
            &self,
            _calendar_id: &str,
            _event_id: &str,
        ) -> Result<(), UpstreamError> {
            Ok(())
        }
    }

    async fn await_next_sync(cache: &EventCache) {
        let mut rx = cache.sync_completions();
        let current = *rx.borrow();
        tokio::time::timeout(Duration::from_secs(2), async {
            while *rx.borrow() <= current {
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("sync to complete");
    }

    async fn new_cache(api: Arc<ScriptedApi>) -> Arc<EventCache> {
        EventCache::new(
            "cal-1",
            api,
            EventPublisher::disabled(),
            fixed_sys(),
            CancellationToken::new(),
        )
        .await
    }

    #[tokio::test]
    async fn first_sync_sorts_and_deduplicates() {
        let api = Arc::new(ScriptedApi::default());
        api.push(Ok(EventsPage {
            items: vec![item("b", ts(2000), ts(3000)), item("a", ts(1000), ts(1500))],
            next_page_token: Some("page-2".into()),
            next_sync_token: None,
        }));
        // the same id appearing again replaces the earlier entry
        api.push(final_page(vec![item("a", ts(500), ts(900))], "token-1"));

        let cache = new_cache(api).await;

        let events = cache
            .try_read(&EventSearchOptions::new().from(ts(0)))
            .await
            .unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(events[0].start_time, ts(500));
    }

    #[tokio::test]
    async fn cancelled_items_remove_cached_events() {
        let api = Arc::new(ScriptedApi::default());
        api.push(final_page(
            vec![item("a", ts(1000), ts(1500)), item("b", ts(2000), ts(3000))],
            "token-1",
        ));
        let cache = new_cache(api.clone()).await;

        api.push(final_page(vec![cancelled("a")], "token-2"));
        cache.trigger_sync();
        await_next_sync(&cache).await;

        let events = cache
            .try_read(&EventSearchOptions::new().from(ts(0)))
            .await
            .unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn read_boundaries_around_min_time() {
        let api = Arc::new(ScriptedApi::default());
        api.push(final_page(vec![], "token-1"));
        let cache = new_cache(api).await;

        let min_time = cache.min_covered_time().await.unwrap();

        // exactly at the lower bound: served from cache
        assert!(cache
            .try_read(&EventSearchOptions::new().from(min_time))
            .await
            .is_some());

        // one nanosecond before: not served
        let just_before = min_time - chrono::Duration::nanoseconds(1);
        assert!(cache
            .try_read(&EventSearchOptions::new().from(just_before))
            .await
            .is_none());

        // without a lower bound the cache never serves
        assert!(cache.try_read(&EventSearchOptions::new()).await.is_none());
    }

    #[tokio::test]
    async fn gone_sync_token_causes_full_resync_without_reopening_the_gate() {
        let api = Arc::new(ScriptedApi::default());
        api.push(final_page(vec![item("a", ts(1000), ts(1500))], "token-1"));
        let cache = new_cache(api.clone()).await;

        // incremental cycle hits a gone token, next cycle resyncs from scratch
        api.push(Err(UpstreamError::Gone));
        api.push(final_page(vec![item("b", ts(2000), ts(2500))], "token-2"));

        cache.trigger_sync();
        await_next_sync(&cache).await;
        cache.trigger_sync();
        await_next_sync(&cache).await;

        let events = cache
            .try_read(&EventSearchOptions::new().from(ts(0)))
            .await
            .unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn unexpected_shape_resets_state() {
        let api = Arc::new(ScriptedApi::default());
        api.push(final_page(vec![item("a", ts(1000), ts(1500))], "token-1"));
        let cache = new_cache(api.clone()).await;

        // a page with neither continuation nor sync token
        api.push(Ok(EventsPage {
            items: vec![],
            next_page_token: None,
            next_sync_token: None,
        }));
        cache.trigger_sync();
        await_next_sync(&cache).await;

        assert!(cache.min_covered_time().await.is_none());
        assert!(cache
            .try_read(&EventSearchOptions::new().from(ts(0)))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn rapid_triggers_coalesce_into_one_sync() {
        let api = Arc::new(ScriptedApi::default());
        api.push(final_page(vec![], "token-1"));
        let cache = new_cache(api.clone()).await;

        let calls_before = api.list_calls.load(Ordering::SeqCst);
        cache.trigger_sync();
        cache.trigger_sync();

        await_next_sync(&cache).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(api.list_calls.load(Ordering::SeqCst), calls_before + 1);
    }

    #[tokio::test]
    async fn mutation_removes_moved_and_deleted_entries() {
        let api = Arc::new(ScriptedApi::default());
        api.push(final_page(
            vec![item("a", ts(1000), ts(1500)), item("b", ts(2000), ts(2500))],
            "token-1",
        ));
        let cache = new_cache(api).await;

        cache.on_mutation("a", MutationKind::MovedAway).await;
        cache.on_mutation("b", MutationKind::Updated).await;

        let events = cache
            .try_read(&EventSearchOptions::new().from(ts(0)))
            .await
            .unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn eviction_drops_past_events_and_advances_min_time() {
        let api = Arc::new(ScriptedApi::default());
        let midnight = test_midnight();

        let mut items = Vec::new();
        for i in 0..EVICT_THRESHOLD as i64 {
            // half ended yesterday, half end tomorrow
            let offset = if i % 2 == 0 { -3600 } else { 3600 * 24 };
            let end = midnight + chrono::Duration::seconds(offset);
            items.push(item(
                &format!("evt-{}", i),
                end - chrono::Duration::minutes(30),
                end,
            ));
        }
        api.push(final_page(items, "token-1"));

        let cache = new_cache(api).await;
        cache.evict_once().await;

        assert_eq!(cache.min_covered_time().await, Some(midnight));
        let events = cache
            .try_read(&EventSearchOptions::new().from(midnight))
            .await
            .unwrap();
        assert_eq!(events.len(), EVICT_THRESHOLD / 2);
        for event in events {
            assert!(event.end_time.unwrap() >= midnight);
        }
    }

    #[tokio::test]
    async fn small_caches_are_not_evicted() {
        let api = Arc::new(ScriptedApi::default());
        let midnight = test_midnight();
        let yesterday = midnight - chrono::Duration::hours(2);
        api.push(final_page(
            vec![item("old", yesterday, yesterday + chrono::Duration::hours(1))],
            "token-1",
        ));

        let cache = new_cache(api).await;
        let min_before = cache.min_covered_time().await;
        cache.evict_once().await;

        assert_eq!(cache.min_covered_time().await, min_before);
        let events = cache
            .try_read(&EventSearchOptions::new().from(min_before.unwrap()))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn append_out_of_window_extends_the_covered_window() {
        let api = Arc::new(ScriptedApi::default());
        api.push(final_page(vec![item("a", ts(50_000), ts(51_000))], "token-1"));
        let cache = new_cache(api).await;

        let min_time = cache.min_covered_time().await.unwrap();
        let floor = min_time - chrono::Duration::days(30);
        let ancient = CalendarEvent {
            id: "ancient".into(),
            calendar_id: "cal-1".into(),
            start_time: floor + chrono::Duration::hours(1),
            end_time: Some(floor + chrono::Duration::hours(2)),
            ..Default::default()
        };

        cache.append_out_of_window(&[ancient.clone()], floor).await;

        assert_eq!(cache.min_covered_time().await, Some(floor));
        let events = cache
            .try_read(&EventSearchOptions::new().from(floor))
            .await
            .unwrap();
        assert_eq!(events.first().map(|e| e.id.as_str()), Some("ancient"));

        // appending the same event again does not duplicate it
        cache.append_out_of_window(&[ancient], floor).await;
        let events = cache
            .try_read(&EventSearchOptions::new().from(floor))
            .await
            .unwrap();
        assert_eq!(events.iter().filter(|e| e.id == "ancient").count(), 1);
    }
}
