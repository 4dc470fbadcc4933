use serde::Deserialize;

/// Kind of content a feed entry carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Text,
    Image,
}

/// One entry of the wall feed as served by `GET /messages`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Message text, or the public image URL for image entries
    pub content: String,
    pub name: String,
    /// Unix epoch milliseconds
    pub timestamp: i64,
}

impl FeedRecord {
    pub fn is_image(&self) -> bool {
        self.kind == RecordKind::Image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_payload() {
        let raw = r#"[
            {"id":"a","type":"text","content":"hello","name":"Ann","timestamp":1700000000000},
            {"id":"b","type":"image","content":"https://cdn/x.png","name":"Bob","timestamp":1700000001000}
        ]"#;
        let records: Vec<FeedRecord> = serde_json::from_str(raw).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, RecordKind::Text);
        assert!(!records[0].is_image());
        assert!(records[1].is_image());
        assert_eq!(records[1].content, "https://cdn/x.png");
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let raw = r#"{"id":"a","type":"video","content":"x","name":"Ann","timestamp":1}"#;
        assert!(serde_json::from_str::<FeedRecord>(raw).is_err());
    }
}
