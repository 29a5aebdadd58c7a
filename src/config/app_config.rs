//! Application configuration.

use std::{path::PathBuf, time::Duration};

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

use super::{
    helpers::deserialize_duration_from_seconds, http_retry::HttpRetryConfig,
};

fn default_polling_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/current_outage.png")
}

fn default_time_format() -> String {
    "%H:%M %d.%m.%Y".to_string()
}

fn default_time_zone() -> Tz {
    chrono_tz::Europe::Kyiv
}

fn default_browser_binary() -> String {
    "chromium".to_string()
}

fn default_shutdowns_url() -> Url {
    Url::parse("https://www.dtek-kem.com.ua/ua/shutdowns").expect("static URL is valid")
}

fn default_ajax_url() -> Url {
    Url::parse("https://www.dtek-kem.com.ua/ua/ajax").expect("static URL is valid")
}

/// Application configuration for outage-watch.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// URL of the SQLite database holding the saved notification state.
    pub database_url: String,

    /// Street the watched address is on, exactly as the source spells it.
    pub street: String,

    /// House number of the watched address.
    pub house: String,

    /// Telegram bot token.
    pub telegram_bot_token: String,

    /// Telegram chat the notifications go to.
    pub telegram_chat_id: i64,

    /// Seconds between reconciliation cycles.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_polling_interval"
    )]
    pub polling_interval_secs: Duration,

    /// Maximum time to wait for graceful shutdown cleanup.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_shutdown_timeout"
    )]
    pub shutdown_timeout_secs: Duration,

    /// Upper bound for one observer fetch (data + snapshot).
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_fetch_timeout"
    )]
    pub fetch_timeout_secs: Duration,

    /// Where the rendered snapshot image is written.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// chrono format string used both for parsing source timestamps and for
    /// rendering times in captions.
    #[serde(default = "default_time_format")]
    pub time_format: String,

    /// Time zone of the source's wall-clock timestamps and of rendered times.
    #[serde(default = "default_time_zone")]
    pub time_zone: Tz,

    /// Headless browser binary used to render the snapshot.
    #[serde(default = "default_browser_binary")]
    pub browser_binary: String,

    /// Public shutdowns page (screenshot target and referer).
    #[serde(default = "default_shutdowns_url")]
    pub shutdowns_url: Url,

    /// The site's ajax endpoint serving outage data.
    #[serde(default = "default_ajax_url")]
    pub ajax_url: Url,

    /// Retry policy for the observer's HTTP client.
    #[serde(default)]
    pub http_retry: HttpRetryConfig,
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading from the configuration directory,
    /// with `OUTAGE_WATCH__`-prefixed environment variables layered on top.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{config_dir}/app.yaml")).required(false))
            .add_source(Environment::with_prefix("OUTAGE_WATCH").separator("__"))
            .build()?;
        s.try_deserialize()
    }

    /// Checks that the fields without sensible defaults were provided.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.is_empty() {
            return Err(ConfigError::Message("database_url is not set".to_string()));
        }
        if self.street.is_empty() {
            return Err(ConfigError::Message("street is not set".to_string()));
        }
        if self.house.is_empty() {
            return Err(ConfigError::Message("house is not set".to_string()));
        }
        if self.telegram_bot_token.is_empty() {
            return Err(ConfigError::Message("telegram_bot_token is not set".to_string()));
        }
        if self.telegram_chat_id == 0 {
            return Err(ConfigError::Message("telegram_chat_id is not set".to_string()));
        }
        Ok(())
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    #[cfg(test)]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// Builder assembling an [`AppConfig`] for tests.
#[cfg(test)]
#[derive(Default)]
pub struct AppConfigBuilder {
    database_url: Option<String>,
    street: Option<String>,
    house: Option<String>,
    telegram_bot_token: Option<String>,
    telegram_chat_id: Option<i64>,
    polling_interval: Option<Duration>,
}

#[cfg(test)]
impl AppConfigBuilder {
    /// Sets the database URL.
    pub fn database_url(mut self, url: &str) -> Self {
        self.database_url = Some(url.to_string());
        self
    }

    /// Sets the watched street.
    pub fn street(mut self, street: &str) -> Self {
        self.street = Some(street.to_string());
        self
    }

    /// Sets the watched house number.
    pub fn house(mut self, house: &str) -> Self {
        self.house = Some(house.to_string());
        self
    }

    /// Sets the bot token.
    pub fn telegram_bot_token(mut self, token: &str) -> Self {
        self.telegram_bot_token = Some(token.to_string());
        self
    }

    /// Sets the target chat.
    pub fn telegram_chat_id(mut self, chat_id: i64) -> Self {
        self.telegram_chat_id = Some(chat_id);
        self
    }

    /// Sets the polling interval.
    pub fn polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = Some(interval);
        self
    }

    /// Builds the config, filling unset fields with test defaults.
    pub fn build(self) -> AppConfig {
        AppConfig {
            database_url: self.database_url.unwrap_or_else(|| "sqlite::memory:".to_string()),
            street: self.street.unwrap_or_else(|| "вул. Хрещатик".to_string()),
            house: self.house.unwrap_or_else(|| "1".to_string()),
            telegram_bot_token: self
                .telegram_bot_token
                .unwrap_or_else(|| "123456:test-token".to_string()),
            telegram_chat_id: self.telegram_chat_id.unwrap_or(-100123),
            polling_interval_secs: self.polling_interval.unwrap_or(default_polling_interval()),
            shutdown_timeout_secs: default_shutdown_timeout(),
            fetch_timeout_secs: default_fetch_timeout(),
            snapshot_path: default_snapshot_path(),
            time_format: default_time_format(),
            time_zone: default_time_zone(),
            browser_binary: default_browser_binary(),
            shutdowns_url: default_shutdowns_url(),
            ajax_url: default_ajax_url(),
            http_retry: HttpRetryConfig::default(),
        }
    }
}
