use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration for the calendar service, loaded from a YAML or JSON file
/// selected by extension.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Config {
    /// Path to the credentials file required to access the upstream
    /// calendar API.
    pub credentials_file: String,

    /// Path to the token file required to access the upstream calendar API.
    pub token_file: String,

    /// Upstream calendar IDs that should be ignored.
    pub ignore_calendars: Vec<String>,

    /// Base URL of the IDM service.
    pub idm_url: String,

    /// Base URL of the events service.
    pub events_service_url: String,

    /// Base URL of the roster service, used for free-slot calculation.
    pub roster_url: String,

    /// Allowed origins for CORS requests.
    pub allowed_origins: Vec<String>,

    /// Address (`[host]:port`) the RPC service listens on.
    #[serde(rename = "listen")]
    pub listen_address: String,

    /// Default ISO country for holiday queries.
    pub default_country: String,

    /// Connection string of the MongoDB instance holding the
    /// resource-calendar collection.
    #[serde(rename = "mongoURL")]
    pub mongo_url: String,

    /// Name of the MongoDB database.
    #[serde(rename = "database")]
    pub mongo_database_name: String,

    /// Free-slot calculation policy.
    pub free_slots: FreeSlotsConfig,

    /// Additional read-only iCal calendars.
    #[serde(rename = "ical")]
    pub icals: Vec<FeedConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct FreeSlotsConfig {
    /// Work shifts carrying any of these tags are ignored.
    pub ignore_shift_tags: Vec<String>,

    /// Name of the roster type considered when calculating free slots.
    pub roster_type_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct FeedConfig {
    /// Unique name of the external calendar; doubles as its calendar ID.
    pub name: String,

    /// Display color for this calendar.
    pub color: String,

    /// One or more iCal URLs merged into a single virtual calendar.
    pub urls: Vec<String>,

    /// Excludes this calendar from requests that do not name it explicitly.
    pub hidden: bool,

    /// Per-feed polling interval, e.g. `30s`, `10m`, `1h`.
    pub polling_interval: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported file format {0:?}")]
    UnsupportedFormat(String),
    #[error("malformed config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

impl Config {
    /// Loads the configuration file from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let mut cfg: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        cfg.apply_defaults();
        Ok(cfg)
    }

    fn apply_defaults(&mut self) {
        if self.listen_address.is_empty() {
            self.listen_address = ":8080".to_string();
        }

        if self.idm_url.is_empty() {
            self.idm_url = std::env::var("IDM_URL").unwrap_or_default();
        }

        if self.default_country.is_empty() {
            self.default_country = "AT".to_string();
        }
    }

    /// The listen address as a socket address actix can bind; a bare
    /// `:port` binds all interfaces.
    pub fn bind_address(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }
}

/// Parses a duration value of the form `30s`, `10m` or `1h`.
pub fn parse_interval(value: &str) -> Option<std::time::Duration> {
    let value = value.trim();
    let (number, unit) = value.split_at(value.len().checked_sub(1)?);
    let number: u64 = number.parse().ok()?;

    match unit {
        "s" => Some(std::time::Duration::from_secs(number)),
        "m" => Some(std::time::Duration::from_secs(number * 60)),
        "h" => Some(std::time::Duration::from_secs(number * 60 * 60)),
        _ => None,
    }
}
