use crate::message::SubmissionRecord;
use crate::message_store::MessageStore;
use tracing::{debug, error};

/// Order records oldest first; records with equal timestamps keep store order
pub fn sort_feed(records: &mut [SubmissionRecord]) {
    records.sort_by_key(|r| r.timestamp);
}

/// Read the whole wall in display order
///
/// Store failures are logged and produce an empty feed so displays keep
/// running.
pub async fn load_feed(store: &dyn MessageStore) -> Vec<SubmissionRecord> {
    metrics::counter!("wall.feed.requests").increment(1);

    match store.read_all().await {
        Ok(mut records) => {
            sort_feed(&mut records);
            debug!(count = records.len(), "Feed loaded");
            records
        }
        Err(e) => {
            error!(error = %e, "Failed to read messages from store");
            metrics::counter!("wall.feed.failures").increment(1);
            Vec::new()
        }
    }
}
