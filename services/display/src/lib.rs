//! Ledger Wall Display
//!
//! Terminal kiosk for the Ledger Wall. Polls the wall service feed, keeps the
//! last good copy on screen and rotates through it one entry at a time with a
//! compact position indicator.
//!
//! ```text
//! GET /messages ──▶ FeedClient ──▶ mpsc ──▶ Rotation ──▶ render (ratatui)
//!                      ▲                       ▲
//!                 refresh timer           rotation timer
//! ```

pub mod config;
pub mod feed_client;
pub mod indicator;
pub mod kiosk;
pub mod record;
pub mod render;
pub mod rotation;

pub use config::DisplayConfig;
pub use feed_client::{DisplayError, FeedClient, FeedSource};
pub use record::{FeedRecord, RecordKind};
pub use rotation::Rotation;
