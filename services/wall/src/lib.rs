//! Ledger Wall Service
//!
//! Submission and feed service for the Ledger Wall event message wall.
//! Attendees post a short text message or a photo from their phone; the
//! venue screens poll the feed and rotate through everything posted so far.
//!
//! ## Features
//!
//! - **Validated Submissions**: name plus exactly one of message or image,
//!   images capped at 5MB and limited to JPEG, PNG, GIF and WebP
//! - **Pluggable Image Storage**: S3-compatible Spaces buckets or a Google
//!   Drive folder, both returning a publicly viewable URL
//! - **Append-only Message List**: one Redis list shared by every instance
//! - **Fail-soft Feed**: displays always get a JSON array, empty when the
//!   store is unreachable
//!
//! ## Architecture
//!
//! ```text
//!  Phone (submit page)                         Venue screen (display page)
//! ┌──────────────┐                             ┌──────────────┐
//! │ POST /submit │                             │ GET /messages│
//! └──────────────┘                             └──────────────┘
//!        │                                            ▲
//!        ▼                                            │
//! ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//! │ Submission   │─────▶│ Message      │─────▶│ Feed         │
//! │ Service      │      │ Store        │      │ (sorted)     │
//! └──────────────┘      │ (Redis list) │      └──────────────┘
//!        │              └──────────────┘
//!        ▼
//! ┌──────────────┐
//! │ Object       │
//! │ Storage      │──▶ Spaces bucket / Drive folder
//! └──────────────┘
//! ```

pub mod api;
pub mod config;
pub mod feed;
pub mod message;
pub mod message_store;
pub mod object_storage;
pub mod submission;

pub use api::{AppState, ErrorResponse, SubmitResponse};
pub use config::Config;
pub use feed::{load_feed, sort_feed};
pub use message::{MessageKind, SubmissionRecord};
pub use message_store::{InMemoryMessageStore, MessageStore, RedisMessageStore, StoreError};
pub use object_storage::{ObjectStorage, UploadError};
pub use submission::{SubmissionForm, SubmissionService, SubmitError, ValidationError};
