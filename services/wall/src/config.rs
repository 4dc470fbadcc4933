use serde::Deserialize;
use thiserror::Error;

/// Errors raised while checking a loaded configuration
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Main configuration for the wall service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Message list store configuration
    #[serde(default)]
    pub redis: RedisConfig,
    /// Image storage configuration
    pub storage: StorageConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Metrics port (0 disables the Prometheus exporter)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Maximum accepted request body, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins (empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Where the message list lives
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    /// Process-local list, lost on restart
    Memory,
}

/// Message list store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Store backend
    #[serde(default)]
    pub backend: StoreBackend,
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key of the list holding the submissions
    #[serde(default = "default_list_key")]
    pub list_key: String,
    /// Reconnect attempts per connection try before a request gives up
    #[serde(default = "default_connect_retries")]
    pub connect_retries: usize,
}

/// Active image storage provider
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// S3-compatible object storage
    Digitalocean,
    /// Google Drive folder
    Googledrive,
}

impl std::fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageProvider::Digitalocean => write!(f, "digitalocean"),
            StorageProvider::Googledrive => write!(f, "googledrive"),
        }
    }
}

/// Image storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Which provider receives uploads
    pub provider: StorageProvider,
    /// S3-compatible provider settings
    pub digitalocean: Option<SpacesConfig>,
    /// Drive provider settings
    pub googledrive: Option<DriveConfig>,
}

/// S3-compatible (DigitalOcean Spaces) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SpacesConfig {
    /// Endpoint URL, e.g. https://sgp1.digitaloceanspaces.com
    pub endpoint: String,
    /// Bucket (Space) name
    pub bucket: String,
    /// Region passed to the signer
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key ID
    pub access_key: String,
    /// Secret access key
    pub secret_key: String,
    /// Use path-style addressing
    #[serde(default = "default_true")]
    pub force_path_style: bool,
}

/// Google Drive configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DriveConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Long-lived refresh token for the uploading account
    pub refresh_token: String,
    /// Folder that receives uploads
    pub folder_id: String,
    /// Token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Drive REST API base
    #[serde(default = "default_drive_api_url")]
    pub api_url: String,
    /// Drive upload API base
    #[serde(default = "default_drive_upload_url")]
    pub upload_url: String,
}

fn default_service_name() -> String {
    "wall-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    8 * 1024 * 1024 // 8MB, room for a 5MB image plus form overhead
}

fn default_true() -> bool {
    true
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_list_key() -> String {
    "messages".to_string()
}

fn default_connect_retries() -> usize {
    2
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_drive_api_url() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_drive_upload_url() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

impl Config {
    /// Load configuration from config files and the environment
    pub fn load() -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("service.name", "wall-service")?
            .set_default("service.log_level", "info")?
            .add_source(config::File::with_name("config/wall").required(false))
            .add_source(config::File::with_name("/etc/ledger-wall/wall").required(false))
            // WALL__STORAGE__PROVIDER -> storage.provider
            .add_source(
                config::Environment::with_prefix("WALL")
                    .separator("__")
                    .try_parsing(true),
            );

        // Plain REDIS_URL is what most hosting platforms inject
        if std::env::var("WALL__REDIS__URL").is_err() {
            if let Ok(url) = std::env::var("REDIS_URL") {
                builder = builder.set_override("redis.url", url)?;
            }
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (used by tests and tooling)
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the selected provider is fully configured
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redis.backend == StoreBackend::Redis && self.redis.url.is_empty() {
            return Err(ConfigError::MissingRequired("redis.url".to_string()));
        }
        if self.redis.list_key.is_empty() {
            return Err(ConfigError::MissingRequired("redis.list_key".to_string()));
        }

        match self.storage.provider {
            StorageProvider::Digitalocean => {
                let spaces = self.storage.digitalocean.as_ref().ok_or_else(|| {
                    ConfigError::MissingRequired("storage.digitalocean".to_string())
                })?;
                require("storage.digitalocean.endpoint", &spaces.endpoint)?;
                require("storage.digitalocean.bucket", &spaces.bucket)?;
                require("storage.digitalocean.access_key", &spaces.access_key)?;
                require("storage.digitalocean.secret_key", &spaces.secret_key)?;
                if !spaces.endpoint.starts_with("http://") && !spaces.endpoint.starts_with("https://")
                {
                    return Err(ConfigError::InvalidValue {
                        key: "storage.digitalocean.endpoint".to_string(),
                        message: "endpoint must start with http:// or https://".to_string(),
                    });
                }
            }
            StorageProvider::Googledrive => {
                let drive = self.storage.googledrive.as_ref().ok_or_else(|| {
                    ConfigError::MissingRequired("storage.googledrive".to_string())
                })?;
                require("storage.googledrive.client_id", &drive.client_id)?;
                require("storage.googledrive.client_secret", &drive.client_secret)?;
                require("storage.googledrive.refresh_token", &drive.refresh_token)?;
                require("storage.googledrive.folder_id", &drive.folder_id)?;
            }
        }

        Ok(())
    }
}

fn require(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingRequired(key.to_string()));
    }
    Ok(())
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            max_body_bytes: default_max_body_bytes(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_redis_url(),
            list_key: default_list_key(),
            connect_retries: default_connect_retries(),
        }
    }
}
