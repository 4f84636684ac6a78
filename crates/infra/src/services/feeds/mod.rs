//! Read-only calendars backed by subscribed iCalendar feeds. Each feed is
//! re-fetched periodically and replaces its previous event list; a feed
//! that fails to fetch keeps serving its last good state.

mod parse;

pub use parse::parse_feed;

use crate::config::{parse_interval, FeedConfig};
use crate::repos::{CalendarError, CalendarReader};
use crate::system::ISys;
use calgate_domain::{Calendar, CalendarEvent, EventSearchOptions};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Base tick of the refresh loop.
const REFRESH_TICK: Duration = Duration::from_secs(5 * 60);
/// Default per-feed poll interval when the config does not override it.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10 * 60);
/// Upper bound for one full refresh pass.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(4 * 60);

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("calendar already registered")]
    AlreadyExists,
}

#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<String>;
}

pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let res = self.client.get(url).send().await?.error_for_status()?;
        Ok(res.text().await?)
    }
}

pub struct FeedRepository {
    fetcher: Arc<dyn FeedFetcher>,
    sys: Arc<dyn ISys>,

    configs: RwLock<Vec<FeedConfig>>,
    events: RwLock<HashMap<String, Vec<CalendarEvent>>>,
    last_updates: Mutex<HashMap<String, DateTime<Utc>>>,

    trigger: mpsc::Sender<()>,
    trigger_rx: Mutex<Option<mpsc::Receiver<()>>>,
}

impl FeedRepository {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, sys: Arc<dyn ISys>) -> Self {
        let (trigger, trigger_rx) = mpsc::channel(1);

        Self {
            fetcher,
            sys,
            configs: RwLock::new(Vec::new()),
            events: RwLock::new(HashMap::new()),
            last_updates: Mutex::new(HashMap::new()),
            trigger,
            trigger_rx: Mutex::new(Some(trigger_rx)),
        }
    }

    /// Registers a feed. Names must be unique; they double as calendar IDs.
    pub fn add(&self, cfg: FeedConfig, trigger_refresh: bool) -> Result<(), FeedError> {
        {
            let mut configs = self.configs.write().unwrap();
            if configs.iter().any(|c| c.name == cfg.name) {
                return Err(FeedError::AlreadyExists);
            }
            configs.push(cfg);
        }

        if trigger_refresh {
            let _ = self.trigger.try_send(());
        }

        Ok(())
    }

    pub fn has(&self, calendar_id: &str) -> bool {
        self.configs
            .read()
            .unwrap()
            .iter()
            .any(|c| c.name == calendar_id)
    }

    fn get_configs(&self) -> Vec<FeedConfig> {
        self.configs.read().unwrap().clone()
    }

    /// Starts the background refresh loop.
    pub fn start(self: &Arc<Self>, shutdown: CancellationToken) {
        let Some(mut trigger_rx) = self.trigger_rx.lock().unwrap().take() else {
            return;
        };

        let repo = self.clone();
        tokio::spawn(async move {
            loop {
                if tokio::time::timeout(REFRESH_TIMEOUT, repo.refresh())
                    .await
                    .is_err()
                {
                    error!("feed refresh pass timed out");
                }

                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(REFRESH_TICK) => {}
                    _ = trigger_rx.recv() => {}
                }
            }
        });
    }

    /// Refreshes every feed that is due. Fetch failures leave the previous
    /// events of that feed untouched.
    pub async fn refresh(&self) {
        let now = self.sys.now();

        for cfg in self.get_configs() {
            let due = {
                let last_updates = self.last_updates.lock().unwrap();
                match last_updates.get(&cfg.name) {
                    Some(last) => {
                        let interval = if cfg.polling_interval.is_empty() {
                            DEFAULT_POLL_INTERVAL
                        } else {
                            match parse_interval(&cfg.polling_interval) {
                                Some(d) => d,
                                None => {
                                    error!(feed = %cfg.name, value = %cfg.polling_interval, "invalid polling interval");
                                    continue;
                                }
                            }
                        };

                        *last + chrono::Duration::from_std(interval).unwrap_or_default() <= now
                    }
                    None => true,
                }
            };

            if !due {
                continue;
            }

            info!(feed = %cfg.name, "updating subscribed calendar");

            let mut merged = Vec::new();
            let mut failed = false;
            for url in &cfg.urls {
                match self.fetcher.fetch(url).await {
                    Ok(payload) => merged.extend(parse_feed(&cfg.name, &payload)),
                    Err(err) => {
                        error!(feed = %cfg.name, url = %url, error = %err, "failed to fetch feed");
                        failed = true;
                        break;
                    }
                }
            }

            if failed {
                // keep whatever we had from the last successful fetch
                continue;
            }

            info!(feed = %cfg.name, count = merged.len(), "loaded events for subscribed calendar");

            self.events
                .write()
                .unwrap()
                .insert(cfg.name.clone(), merged);
            self.last_updates.lock().unwrap().insert(cfg.name, now);
        }
    }

    fn exists(&self, calendar_id: &str) -> Result<(), CalendarError> {
        if self.has(calendar_id) {
            Ok(())
        } else {
            Err(CalendarError::NotFound)
        }
    }
}

#[async_trait::async_trait]
impl CalendarReader for FeedRepository {
    async fn list_calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        Ok(self
            .get_configs()
            .into_iter()
            .map(|cfg| Calendar {
                id: cfg.name.clone(),
                name: cfg.name,
                timezone: "Local".to_string(),
                color: cfg.color,
                readonly: true,
                hidden: cfg.hidden,
            })
            .collect())
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        search: &EventSearchOptions,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        self.exists(calendar_id)?;

        let events = self.events.read().unwrap();
        Ok(events
            .get(calendar_id)
            .map(|all| all.iter().filter(|e| search.matches(e)).cloned().collect())
            .unwrap_or_default())
    }

    async fn load_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        _ignore_cache: bool,
    ) -> Result<CalendarEvent, CalendarError> {
        self.exists(calendar_id)?;

        let events = self.events.read().unwrap();
        events
            .get(calendar_id)
            .and_then(|all| all.iter().find(|e| e.id == event_id))
            .cloned()
            .ok_or(CalendarError::NotFound)
    }
}
