//! Submission intake: validation, image relay and persistence.

use crate::message::{MessageKind, SubmissionRecord};
use crate::message_store::{MessageStore, StoreError};
use crate::object_storage::{ObjectStorage, UploadError};
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Largest accepted image, in bytes (5MB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Declared content types accepted for images
pub const ALLOWED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// A submission rule that the request broke
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,

    #[error("Either message or image is required")]
    ContentRequired,

    #[error("Please submit either a message or an image, not both")]
    BothContentKinds,

    #[error("Image size must be less than 5MB")]
    ImageTooLarge,

    #[error("Invalid image type. Only JPEG, PNG, GIF, and WebP are allowed")]
    UnsupportedImageType,
}

impl ValidationError {
    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::NameRequired => "name_required",
            ValidationError::ContentRequired => "content_required",
            ValidationError::BothContentKinds => "both_content_kinds",
            ValidationError::ImageTooLarge => "image_too_large",
            ValidationError::UnsupportedImageType => "unsupported_image_type",
        }
    }
}

/// Errors from accepting a submission
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to submit message: {0}")]
    Upload(#[from] UploadError),

    #[error("Failed to submit message: {0}")]
    Store(#[from] StoreError),
}

/// Uploaded image part of a submission
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub content_type: String,
    pub file_name: String,
}

impl ImageUpload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Raw submission fields as received from the form
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub name: Option<String>,
    pub message: Option<String>,
    pub image: Option<ImageUpload>,
}

/// A submission that passed every rule
#[derive(Debug, Clone)]
pub enum ValidSubmission {
    Text { name: String, message: String },
    Image { name: String, image: ImageUpload },
}

impl ValidSubmission {
    pub fn kind(&self) -> MessageKind {
        match self {
            ValidSubmission::Text { .. } => MessageKind::Text,
            ValidSubmission::Image { .. } => MessageKind::Image,
        }
    }
}

impl SubmissionForm {
    /// Apply the submission rules in order; the first broken rule wins
    pub fn validate(self) -> Result<ValidSubmission, ValidationError> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(ValidationError::NameRequired)?
            .to_string();

        let message = self
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        let image = self.image.filter(|i| !i.is_empty());

        match (message, image) {
            (None, None) => Err(ValidationError::ContentRequired),
            (Some(_), Some(_)) => Err(ValidationError::BothContentKinds),
            (Some(message), None) => Ok(ValidSubmission::Text { name, message }),
            (None, Some(image)) => {
                if image.len() > MAX_IMAGE_BYTES {
                    return Err(ValidationError::ImageTooLarge);
                }
                if !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
                    return Err(ValidationError::UnsupportedImageType);
                }
                Ok(ValidSubmission::Image { name, image })
            }
        }
    }
}

/// Accepts submissions and appends them to the message list
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn MessageStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn MessageStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { store, storage }
    }

    /// Validate, upload the image if any, then persist the record
    #[instrument(skip(self, form))]
    pub async fn submit(&self, form: SubmissionForm) -> Result<SubmissionRecord, SubmitError> {
        let submission = match form.validate() {
            Ok(submission) => submission,
            Err(e) => {
                warn!(reason = e.reason(), "Submission rejected");
                metrics::counter!("wall.submissions.rejected", "reason" => e.reason()).increment(1);
                return Err(e.into());
            }
        };

        let record = match submission {
            ValidSubmission::Text { name, message } => SubmissionRecord::text(message, name),
            ValidSubmission::Image { name, image } => {
                let url = self
                    .storage
                    .store(image.bytes, &image.content_type, &image.file_name)
                    .await
                    .map_err(|e| {
                        error!(error = %e, provider = self.storage.provider(), "Image upload failed");
                        e
                    })?;
                metrics::counter!("wall.uploads.completed", "provider" => self.storage.provider())
                    .increment(1);
                SubmissionRecord::image(url, name)
            }
        };

        if let Err(e) = self.store.append(&record).await {
            if record.kind == MessageKind::Image {
                // The blob stays behind; nothing references it.
                warn!(url = %record.content, "Uploaded image orphaned by failed append");
            }
            error!(error = %e, "Failed to append submission");
            return Err(e.into());
        }

        info!(id = %record.id, kind = %record.kind, "Submission accepted");
        metrics::counter!("wall.submissions.accepted", "kind" => record.kind.as_str()).increment(1);

        Ok(record)
    }
}
