use calgate_domain::{Calendar, Profile};
use calgate_infra::cache::{Cache, Index, LoaderFn};
use calgate_infra::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DIRECTORY_RELOAD_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Capability object over the polling caches of directory data: user
/// profiles and the unified calendar list, with the secondary indexes the
/// request handlers need.
pub struct Directory {
    pub profiles: Cache<Profile>,
    pub by_user_id: Arc<Index<String, Profile>>,
    pub user_by_calendar_id: Arc<Index<String, Profile>>,

    pub calendars: Cache<Calendar>,
    pub calendar_by_id: Arc<Index<String, Calendar>>,
}

impl Directory {
    pub fn new(profiles: Cache<Profile>, calendars: Cache<Calendar>) -> Self {
        let by_user_id = profiles.create_index(|p: &Profile| Some(p.user.id.clone()));
        let user_by_calendar_id = profiles.create_index(|p: &Profile| p.calendar_id());
        let calendar_by_id = calendars.create_index(|c: &Calendar| Some(c.id.clone()));

        Self {
            profiles,
            by_user_id,
            user_by_calendar_id,
            calendars,
            calendar_by_id,
        }
    }

    pub fn from_context(ctx: &Context) -> Self {
        let idm = ctx.idm.clone();
        let profiles = Cache::new(
            "profiles",
            DIRECTORY_RELOAD_INTERVAL,
            LoaderFn(move || {
                let idm = idm.clone();
                async move { idm.list_profiles().await }
            }),
        );

        let facade = ctx.facade.clone();
        let calendars = Cache::new(
            "calendars",
            DIRECTORY_RELOAD_INTERVAL,
            LoaderFn(move || {
                let facade = facade.clone();
                async move { facade.list_calendars().await.map_err(anyhow::Error::new) }
            }),
        );

        Self::new(profiles, calendars)
    }

    pub fn start(&self, shutdown: CancellationToken) {
        self.profiles.start(shutdown.clone());
        self.calendars.start(shutdown);
    }

    /// The calendar assigned to a user's profile, if both exist.
    pub fn resolve_user_calendar(&self, user_id: &str) -> Option<String> {
        self.by_user_id.get(&user_id.to_string())?.calendar_id()
    }
}
