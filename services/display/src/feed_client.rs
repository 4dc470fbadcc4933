use crate::config::DisplayConfig;
use crate::record::FeedRecord;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};

/// Feed fetch failures shown on the kiosk banner
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Server returned non-JSON response")]
    NotJson,

    #[error("Invalid feed payload: {0}")]
    Decode(String),
}

/// Source of the wall feed
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<FeedRecord>, DisplayError>;
}

/// Polls the wall service feed endpoint
pub struct FeedClient {
    client: reqwest::Client,
    feed_url: String,
}

impl FeedClient {
    pub fn new(config: &DisplayConfig) -> Result<Self, DisplayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            feed_url: config.feed_url.clone(),
        })
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    #[instrument(skip(self), fields(url = %self.feed_url))]
    async fn fetch(&self) -> Result<Vec<FeedRecord>, DisplayError> {
        // Cache buster; the endpoint also sends no-cache headers
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();

        let response = self
            .client
            .get(&self.feed_url)
            .query(&[("timestamp", timestamp)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DisplayError::Status(status.as_u16()));
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        if !is_json {
            return Err(DisplayError::NotJson);
        }

        let body = response.bytes().await?;
        let records: Vec<FeedRecord> =
            serde_json::from_slice(&body).map_err(|e| DisplayError::Decode(e.to_string()))?;

        debug!(count = records.len(), "Feed fetched");
        Ok(records)
    }
}
