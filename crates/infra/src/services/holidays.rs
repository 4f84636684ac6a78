use anyhow::Context as _;
use calgate_domain::PublicHoliday;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

const HOLIDAY_API_BASE_URL: &str = "https://date.nager.at/api/v3";

/// Lookup of public holidays by country and year.
#[async_trait::async_trait]
pub trait HolidayGetter: Send + Sync {
    async fn get(&self, country: &str, year: i32) -> anyhow::Result<Vec<PublicHoliday>>;

    async fn is_holiday(
        &self,
        country: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<PublicHoliday>> {
        let holidays = self.get(country, date.year()).await?;
        let wanted = date.format("%Y-%m-%d").to_string();

        Ok(holidays.into_iter().find(|h| h.date == wanted))
    }
}

/// Stateless adapter over the public holiday HTTP API.
pub struct HolidayApi {
    http: reqwest::Client,
    base_url: String,
}

impl HolidayApi {
    pub fn new() -> Self {
        Self::with_base_url(HOLIDAY_API_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for HolidayApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HolidayGetter for HolidayApi {
    async fn get(&self, country: &str, year: i32) -> anyhow::Result<Vec<PublicHoliday>> {
        let res = self
            .http
            .get(format!(
                "{}/PublicHolidays/{}/{}",
                self.base_url, year, country
            ))
            .send()
            .await
            .context("holiday api request failed")?
            .error_for_status()
            .context("holiday api request rejected")?;

        res.json().await.context("failed to unmarshal holidays")
    }
}

/// Memoizes holiday lookups per `(country, year)`; holiday sets never
/// change within a process lifetime.
pub struct HolidayCache {
    getter: Arc<dyn HolidayGetter>,
    cache: RwLock<HashMap<(String, i32), Vec<PublicHoliday>>>,
}

impl HolidayCache {
    pub fn new(getter: Arc<dyn HolidayGetter>) -> Self {
        Self {
            getter,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl HolidayGetter for HolidayCache {
    async fn get(&self, country: &str, year: i32) -> anyhow::Result<Vec<PublicHoliday>> {
        let key = (country.to_string(), year);

        if let Some(cached) = self.cache.read().unwrap().get(&key) {
            return Ok(cached.clone());
        }

        let holidays = self.getter.get(country, year).await?;
        self.cache
            .write()
            .unwrap()
            .insert(key, holidays.clone());

        Ok(holidays)
    }
}
