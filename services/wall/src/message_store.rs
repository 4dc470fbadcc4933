use crate::config::RedisConfig;
use crate::message::SubmissionRecord;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::VecDeque;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument, warn};

/// Errors from the message list store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Message store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Append-only list of submission records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Push a record onto the head of the list
    async fn append(&self, record: &SubmissionRecord) -> Result<(), StoreError>;

    /// Read every record, in the order the store returns them
    async fn read_all(&self) -> Result<Vec<SubmissionRecord>, StoreError>;

    /// Check that the backing store answers
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Redis-backed message list
///
/// The connection is opened on first use and then shared by every request;
/// the connection manager reconnects on its own after failures. Until Redis
/// answers, every call fails with `StoreError::Unavailable` and the next call
/// tries again.
pub struct RedisMessageStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    list_key: String,
    connect_retries: usize,
}

impl RedisMessageStore {
    /// Create the store without touching the network; only the URL is checked
    pub fn new(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url.as_str())?;

        info!(list_key = %config.list_key, "Redis message store configured");

        Ok(Self {
            client,
            conn: OnceCell::new(),
            list_key: config.list_key.clone(),
            connect_retries: config.connect_retries,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| async move {
                let conn =
                    ConnectionManager::new_with_backoff(self.client.clone(), 2, 100, self.connect_retries)
                        .await?;
                info!("Connected to Redis message store");
                Ok::<_, StoreError>(conn)
            })
            .await?;

        Ok(conn.clone())
    }
}

#[async_trait]
impl MessageStore for RedisMessageStore {
    #[instrument(skip(self, record), fields(id = %record.id, kind = %record.kind))]
    async fn append(&self, record: &SubmissionRecord) -> Result<(), StoreError> {
        let entry = serde_json::to_string(record)?;
        let mut conn = self.connection().await?;
        let len: i64 = conn.lpush(&self.list_key, entry).await?;

        debug!(list_len = len, "Record appended");
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        let mut conn = self.connection().await?;
        let entries: Vec<String> = conn.lrange(&self.list_key, 0, -1).await?;

        Ok(decode_entries(&entries))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

/// Deserialize stored entries, skipping any that are not valid records
fn decode_entries(entries: &[String]) -> Vec<SubmissionRecord> {
    entries
        .iter()
        .filter_map(|entry| match serde_json::from_str(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping malformed message entry");
                None
            }
        })
        .collect()
}

/// Process-local message list with the same head-push ordering as Redis
#[derive(Default)]
pub struct InMemoryMessageStore {
    entries: Mutex<VecDeque<String>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, record: &SubmissionRecord) -> Result<(), StoreError> {
        let entry = serde_json::to_string(record)?;
        self.entries.lock().await.push_front(entry);
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        let entries = self.entries.lock().await;
        let entries: Vec<String> = entries.iter().cloned().collect();
        Ok(decode_entries(&entries))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_append_then_read_all_returns_every_record() {
        let store = InMemoryMessageStore::new();
        let mut ids = HashSet::new();

        for i in 0..25 {
            let record = SubmissionRecord::text(format!("note {i}"), "Ann");
            ids.insert(record.id.clone());
            store.append(&record).await.unwrap();
        }

        let records = store.read_all().await.unwrap();
        assert_eq!(records.len(), 25);
        let read_ids: HashSet<_> = records.into_iter().map(|r| r.id).collect();
        assert_eq!(read_ids, ids);
    }

    #[tokio::test]
    async fn test_newest_record_is_at_head() {
        let store = InMemoryMessageStore::new();
        let first = SubmissionRecord::text("first", "Ann");
        let second = SubmissionRecord::image("https://cdn.example/b.png", "Bob");
        store.append(&first).await.unwrap();
        store.append(&second).await.unwrap();

        let records = store.read_all().await.unwrap();
        assert_eq!(records[0], second);
        assert_eq!(records[1], first);
        assert_eq!(records[0].kind, MessageKind::Image);
    }

    #[tokio::test]
    async fn test_empty_store_reads_empty() {
        let store = InMemoryMessageStore::new();
        assert!(store.is_empty().await);
        assert!(store.read_all().await.unwrap().is_empty());
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let store = std::sync::Arc::new(InMemoryMessageStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let record = SubmissionRecord::text(format!("{i}"), "Ann");
                store.append(&record).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.len().await, 16);
    }

    fn redis_config(url: &str, list_key: &str) -> RedisConfig {
        RedisConfig {
            url: url.to_string(),
            list_key: list_key.to_string(),
            connect_retries: 0,
            ..RedisConfig::default()
        }
    }

    #[test]
    fn test_invalid_redis_url_rejected() {
        assert!(RedisMessageStore::new(&redis_config("not-a-url", "messages")).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_redis_fails_per_call() {
        let store = RedisMessageStore::new(&redis_config("redis://127.0.0.1:1", "messages")).unwrap();

        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.read_all().await, Err(StoreError::Unavailable(_))));
        let record = SubmissionRecord::text("hello", "Ann");
        assert!(matches!(store.append(&record).await, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    #[ignore = "needs a running Redis at REDIS_URL"]
    async fn test_redis_list_round_trip() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let list_key = format!("messages-test-{}", uuid::Uuid::new_v4());
        let store = RedisMessageStore::new(&redis_config(&url, &list_key)).unwrap();
        store.ping().await.unwrap();

        let first = SubmissionRecord::text("first", "Ann");
        let second = SubmissionRecord::image("https://cdn.example/b.png", "Bob");
        store.append(&first).await.unwrap();
        store.append(&second).await.unwrap();

        let records = store.read_all().await.unwrap();
        assert_eq!(records, vec![second, first]);

        let mut conn = store.connection().await.unwrap();
        let _: i64 = conn.del(&list_key).await.unwrap();
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let good = serde_json::to_string(&SubmissionRecord::text("ok", "Ann")).unwrap();
        let entries = vec!["not json".to_string(), good, r#"{"id":"x"}"#.to_string()];

        let records = decode_entries(&entries);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "ok");
    }
}
