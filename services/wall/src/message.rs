use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which kind of content a submission carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text note
    Text,
    /// Public URL of an uploaded image
    Image,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted wall submission, as stored in the message list and served
/// on the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Unique submission ID
    pub id: String,
    /// Content kind
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Message body for text, public URL for images
    pub content: String,
    /// Author display name
    pub name: String,
    /// Acceptance time in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl SubmissionRecord {
    /// Build a new record stamped with a fresh ID and the current time
    pub fn new(kind: MessageKind, content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            content: content.into(),
            name: name.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn text(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(MessageKind::Text, content, name)
    }

    pub fn image(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(MessageKind::Image, url, name)
    }
}
