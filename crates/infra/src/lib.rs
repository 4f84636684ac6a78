pub mod cache;
mod config;
pub mod repos;
pub mod services;
mod system;

pub use config::{parse_interval, Config, ConfigError, FeedConfig, FreeSlotsConfig};
pub use system::{ISys, RealSys};

use anyhow::Context as _;
use repos::{
    CalendarFacade, IResourceCalendarRepo, InMemoryResourceCalendarRepo,
    MongoResourceCalendarRepo,
};
use services::events::EventPublisher;
use services::feeds::{FeedFetcher, FeedRepository, HttpFeedFetcher};
use services::google_calendar::GoogleCalendarBackend;
use services::holidays::{HolidayApi, HolidayCache, HolidayGetter};
use services::idm::IdmClient;
use services::roster::RosterClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Everything the service layer needs, wired once at startup.
#[derive(Clone)]
pub struct Context {
    pub config: Config,
    pub google: Arc<GoogleCalendarBackend>,
    pub feeds: Arc<FeedRepository>,
    pub facade: Arc<CalendarFacade>,
    pub resources: Arc<dyn IResourceCalendarRepo>,
    pub idm: Arc<IdmClient>,
    pub roster: Arc<RosterClient>,
    pub holidays: Arc<dyn HolidayGetter>,
    pub publisher: EventPublisher,
    pub sys: Arc<dyn ISys>,
    pub shutdown: CancellationToken,
}

/// Builds the production context from the configuration: connects the
/// document store, registers the subscribed feeds and prepares the upstream
/// backend with its per-calendar caches.
pub async fn setup_context(config: Config) -> anyhow::Result<Context> {
    let shutdown = CancellationToken::new();
    let sys: Arc<dyn ISys> = Arc::new(RealSys {});

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_url)
        .await
        .context("failed to connect to the document store")?;
    let db = mongo_client.database(&config.mongo_database_name);
    // fail fast when the store is unreachable
    db.run_command(mongodb::bson::doc! { "ping": 1 }, None)
        .await
        .context("document store ping failed")?;
    info!("document store connection established");

    let resources: Arc<dyn IResourceCalendarRepo> =
        Arc::new(MongoResourceCalendarRepo::new(&db).await?);

    let fetcher: Arc<dyn FeedFetcher> = Arc::new(HttpFeedFetcher::new());
    let feeds = Arc::new(FeedRepository::new(fetcher, sys.clone()));
    for feed in &config.icals {
        feeds
            .add(feed.clone(), false)
            .map_err(|err| anyhow::anyhow!("failed to register feed {}: {}", feed.name, err))?;
    }
    feeds.start(shutdown.clone());

    let publisher = EventPublisher::new(config.events_service_url.clone());

    let google =
        GoogleCalendarBackend::from_config(&config, publisher.clone(), sys.clone(), shutdown.clone())
            .await
            .context("failed to prepare upstream calendar backend")?;

    let facade = Arc::new(CalendarFacade::new(google.clone(), feeds.clone()));

    let idm = Arc::new(IdmClient::new(config.idm_url.clone()));
    let roster = Arc::new(RosterClient::new(config.roster_url.clone()));
    let holidays: Arc<dyn HolidayGetter> =
        Arc::new(HolidayCache::new(Arc::new(HolidayApi::new())));

    Ok(Context {
        config,
        google,
        feeds,
        facade,
        resources,
        idm,
        roster,
        holidays,
        publisher,
        sys,
        shutdown,
    })
}

/// A context over in-memory repositories and a caller-supplied upstream;
/// used by tests and local development.
pub fn create_test_context(
    google: Arc<GoogleCalendarBackend>,
    feeds: Arc<FeedRepository>,
    sys: Arc<dyn ISys>,
    config: Config,
) -> Context {
    let facade = Arc::new(CalendarFacade::new(google.clone(), feeds.clone()));
    let holidays: Arc<dyn HolidayGetter> =
        Arc::new(HolidayCache::new(Arc::new(HolidayApi::new())));

    Context {
        idm: Arc::new(IdmClient::new(config.idm_url.clone())),
        roster: Arc::new(RosterClient::new(config.roster_url.clone())),
        config,
        google,
        feeds,
        facade,
        resources: Arc::new(InMemoryResourceCalendarRepo::new()),
        holidays,
        publisher: EventPublisher::disabled(),
        sys,
        shutdown: CancellationToken::new(),
    }
}
