//! Image storage providers.
//!
//! Exactly one provider is active per deployment. It is chosen once at
//! startup from `storage.provider` and shared behind `Arc<dyn ObjectStorage>`.

pub mod drive;
pub mod spaces;

use crate::config::{StorageConfig, StorageProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use drive::DriveStorage;
pub use spaces::SpacesStorage;

/// Errors raised while storing an uploaded image
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload request failed: {0}")]
    Request(String),

    #[error("Storage provider rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Storage provider authentication failed: {0}")]
    Auth(String),

    #[error("Unexpected storage provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        UploadError::Request(e.to_string())
    }
}

/// Stores one binary object and hands back a world-readable URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload `bytes` and return its public URL
    async fn store(
        &self,
        bytes: Bytes,
        content_type: &str,
        file_name: &str,
    ) -> Result<String, UploadError>;

    /// Provider name for logs and metrics
    fn provider(&self) -> &'static str;
}

/// Build the configured provider
pub async fn from_config(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>> {
    let storage: Arc<dyn ObjectStorage> = match config.provider {
        StorageProvider::Digitalocean => {
            let spaces = config
                .digitalocean
                .as_ref()
                .context("storage.digitalocean section missing")?;
            Arc::new(SpacesStorage::new(spaces).await)
        }
        StorageProvider::Googledrive => {
            let drive = config
                .googledrive
                .as_ref()
                .context("storage.googledrive section missing")?;
            Arc::new(DriveStorage::new(drive.clone()).context("Failed to build Drive client")?)
        }
    };

    Ok(storage)
}

/// Generate a unique object key that keeps the original file extension
///
/// Format: `{uuid}.{ext}`, with `jpg` when the name has no extension.
pub fn object_key(file_name: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), file_extension(file_name))
}

fn file_extension(file_name: &str) -> String {
    let ext = match file_name.rsplit_once('.') {
        Some((_, ext)) => sanitize_extension(ext),
        None => String::new(),
    };

    if ext.is_empty() {
        "jpg".to_string()
    } else {
        ext
    }
}

/// Keep only characters that are safe in an object key
fn sanitize_extension(ext: &str) -> String {
    ext.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(10)
        .collect::<String>()
        .to_lowercase()
}
