use crate::feed_client::DisplayError;
use crate::record::FeedRecord;
use tracing::warn;

/// Working set of the kiosk: the last good feed, the rotation position and
/// the banner text of the most recent failed fetch
#[derive(Debug, Default)]
pub struct Rotation {
    feed: Vec<FeedRecord>,
    position: usize,
    error: Option<String>,
}

impl Rotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a freshly fetched feed
    ///
    /// The position survives and is reduced against the new length on use.
    pub fn replace_feed(&mut self, feed: Vec<FeedRecord>) {
        self.feed = feed;
        self.error = None;
    }

    /// Record a fetch outcome; failures keep the previous feed on screen
    pub fn apply_fetch(&mut self, result: Result<Vec<FeedRecord>, DisplayError>) {
        match result {
            Ok(feed) => self.replace_feed(feed),
            Err(e) => {
                warn!(error = %e, "Feed refresh failed");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Move to the next entry, wrapping at the end; idle while empty
    pub fn advance(&mut self) {
        if let Some(current) = self.current_index() {
            self.position = (current + 1) % self.feed.len();
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        if self.feed.is_empty() {
            None
        } else {
            Some(self.position % self.feed.len())
        }
    }

    pub fn current(&self) -> Option<&FeedRecord> {
        self.current_index().map(|i| &self.feed[i])
    }

    pub fn len(&self) -> usize {
        self.feed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feed.is_empty()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;

    fn feed(n: usize) -> Vec<FeedRecord> {
        (0..n)
            .map(|i| FeedRecord {
                id: format!("m{i}"),
                kind: RecordKind::Text,
                content: format!("message {i}"),
                name: "Ann".to_string(),
                timestamp: i as i64,
            })
            .collect()
    }

    #[test]
    fn test_empty_rotation_is_idle() {
        let mut rotation = Rotation::new();
        rotation.advance();
        assert!(rotation.is_empty());
        assert_eq!(rotation.current_index(), None);
        assert!(rotation.current().is_none());
    }

    #[test]
    fn test_advance_wraps() {
        let mut rotation = Rotation::new();
        rotation.replace_feed(feed(3));

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(rotation.current_index().unwrap());
            rotation.advance();
        }
        assert_eq!(seen, [0, 1, 2, 0]);
    }

    #[test]
    fn test_index_reduced_after_feed_shrinks() {
        let mut rotation = Rotation::new();
        rotation.replace_feed(feed(5));
        for _ in 0..4 {
            rotation.advance();
        }
        assert_eq!(rotation.current_index(), Some(4));

        rotation.replace_feed(feed(3));
        assert_eq!(rotation.current_index(), Some(1));
        assert_eq!(rotation.current().unwrap().id, "m1");

        rotation.advance();
        assert_eq!(rotation.current_index(), Some(2));
    }

    #[test]
    fn test_failed_fetch_keeps_last_feed() {
        let mut rotation = Rotation::new();
        rotation.apply_fetch(Ok(feed(2)));
        rotation.apply_fetch(Err(DisplayError::Status(500)));

        assert_eq!(rotation.len(), 2);
        assert_eq!(rotation.error(), Some("HTTP 500"));

        rotation.apply_fetch(Ok(feed(3)));
        assert_eq!(rotation.len(), 3);
        assert_eq!(rotation.error(), None);
    }
}
