use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while checking a loaded configuration
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Kiosk configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Feed endpoint of the wall service
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    /// Seconds between feed refreshes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Seconds each message stays on screen
    #[serde(default = "default_rotation_interval")]
    pub rotation_interval_secs: u64,
    /// Per-request timeout for feed fetches
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Log level used when RUST_LOG is set without directives
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_feed_url() -> String {
    "http://127.0.0.1:8080/messages".to_string()
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_rotation_interval() -> u64 {
    6
}

fn default_request_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            refresh_interval_secs: default_refresh_interval(),
            rotation_interval_secs: default_rotation_interval(),
            request_timeout_secs: default_request_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl DisplayConfig {
    /// Load configuration from `config/display` and `DISPLAY__*` variables
    pub fn load() -> anyhow::Result<Self> {
        let config: DisplayConfig = config::Config::builder()
            .add_source(config::File::with_name("config/display").required(false))
            // DISPLAY__FEED_URL -> feed_url
            .add_source(
                config::Environment::with_prefix("DISPLAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let config: DisplayConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.feed_url.starts_with("http://") && !self.feed_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "feed_url".to_string(),
                message: "feed_url must start with http:// or https://".to_string(),
            });
        }
        for (key, value) in [
            ("refresh_interval_secs", self.refresh_interval_secs),
            ("rotation_interval_secs", self.rotation_interval_secs),
            ("request_timeout_secs", self.request_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
