//! File-based message source.
//!
//! Serves messages from a JSON dump of the backend's list endpoint and
//! applies the filter locally, the way the backend would.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{MessageFilter, MessageSource, SourceError};
use crate::data::{Message, MessageBatch};

/// A message source backed by a JSON file shaped like
/// `{"messages": [...], "isTopicRw": bool}`.
///
/// The file is re-read only when its modification time changes; otherwise
/// the parsed batch is reused.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    cache: Mutex<Option<(SystemTime, MessageBatch)>>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            cache: Mutex::new(None),
        }
    }

    /// Returns the path being served.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<MessageBatch, SourceError> {
        let modified = tokio::fs::metadata(&self.path)
            .await
            .and_then(|m| m.modified())
            .map_err(|e| SourceError::Read(e.to_string()))?;

        if let Some((cached_at, batch)) = self.cache.lock().as_ref() {
            if *cached_at == modified {
                return Ok(batch.clone());
            }
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Read(e.to_string()))?;
        let batch: MessageBatch =
            serde_json::from_str(&content).map_err(|e| SourceError::Parse(e.to_string()))?;

        debug!(
            "Loaded {} messages from {}",
            batch.messages.len(),
            self.path.display()
        );
        *self.cache.lock() = Some((modified, batch.clone()));
        Ok(batch)
    }
}

#[async_trait]
impl MessageSource for FileSource {
    async fn fetch(&self, filter: &MessageFilter) -> Result<MessageBatch, SourceError> {
        let batch = self.load().await?;
        let query = filter.to_query();
        Ok(MessageBatch {
            messages: apply_query(batch.messages, &query),
            is_topic_rw: batch.is_topic_rw,
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}

fn number(query: &BTreeMap<String, String>, key: &str) -> Option<f64> {
    query.get(key).and_then(|v| v.parse().ok())
}

fn count(query: &BTreeMap<String, String>, key: &str) -> Option<usize> {
    query.get(key).and_then(|v| v.parse().ok())
}

fn matches(message: &Message, query: &BTreeMap<String, String>) -> bool {
    if let Some(topic) = query.get("topic") {
        if !message.topic.is_empty() && !topic.is_empty() && &message.topic != topic {
            return false;
        }
    }
    if query.get("onlyMsgRoot").map(String::as_str) == Some("true")
        && message.in_reply_of_id_root.is_some()
    {
        return false;
    }
    if number(query, "dateMinUpdate").is_some_and(|min| message.date_update < min)
        || number(query, "dateMaxUpdate").is_some_and(|max| message.date_update > max)
        || number(query, "dateMinCreation").is_some_and(|min| message.date_creation < min)
        || number(query, "dateMaxCreation").is_some_and(|max| message.date_creation > max)
    {
        return false;
    }
    if let Some(text) = query.get("text") {
        if !message.text.to_lowercase().contains(&text.to_lowercase()) {
            return false;
        }
    }
    if let Some(label) = query.get("label") {
        if !message.labels.iter().any(|l| &l.text == label) {
            return false;
        }
    }
    if let Some(tag) = query.get("tag") {
        if !message.tags.iter().any(|t| t == tag) {
            return false;
        }
    }
    true
}

/// Filter, order newest first, and page `messages`.
fn apply_query(messages: Vec<Message>, query: &BTreeMap<String, String>) -> Vec<Message> {
    let strip_replies = query.get("treeView").map(String::as_str) == Some("notree");

    let mut selected: Vec<Message> = messages
        .into_iter()
        .filter(|m| matches(m, query))
        .map(|mut m| {
            if strip_replies {
                m.replies.clear();
            }
            m
        })
        .collect();
    selected.sort_by(|a, b| b.date_creation.total_cmp(&a.date_creation));

    let skip = count(query, "skip").unwrap_or(0);
    let limit = count(query, "limit").unwrap_or(usize::MAX);
    selected.into_iter().skip(skip).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r##"{
            "isTopicRw": true,
            "messages": [
                {"_id": "a", "text": "#monitoring #api #item:db disk full", "topic": "/ops",
                 "labels": [{"text": "AL", "color": "#d04437"}],
                 "dateCreation": 10, "dateUpdate": 40,
                 "replies": [{"_id": "a1", "inReplyOfIDRoot": "a", "dateCreation": 11}]},
                {"_id": "b", "text": "deploy done", "topic": "/ops",
                 "labels": [{"text": "UP", "color": "#14892c"}],
                 "dateCreation": 30, "dateUpdate": 30},
                {"_id": "c", "text": "elsewhere", "topic": "/other",
                 "dateCreation": 20, "dateUpdate": 20},
                {"_id": "d", "text": "a reply", "topic": "/ops", "inReplyOfIDRoot": "b",
                 "dateCreation": 35, "dateUpdate": 35}
            ]
        }"##
    }

    fn source_with(content: &str) -> (NamedTempFile, FileSource) {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        let source = FileSource::new(file.path());
        (file, source)
    }

    fn ids(batch: &MessageBatch) -> Vec<&str> {
        batch.messages.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/messages.json");
        assert_eq!(source.path(), Path::new("/tmp/messages.json"));
        assert_eq!(source.description(), "file: /tmp/messages.json");
    }

    #[tokio::test]
    async fn test_fetch_filters_topic_and_replies() {
        let (_file, source) = source_with(sample_json());

        let batch = source.fetch(&MessageFilter::new("/ops")).await.unwrap();
        assert!(batch.is_topic_rw);
        assert_eq!(ids(&batch), vec!["b", "a"]);
        // notree strips nested replies
        assert!(batch.messages[1].replies.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_keeps_replies_in_tree_view() {
        let (_file, source) = source_with(sample_json());
        let mut filter = MessageFilter::new("/ops");
        filter.tree_view = "onetree".to_string();

        let batch = source.fetch(&filter).await.unwrap();
        let a = batch.messages.iter().find(|m| m.id == "a").unwrap();
        assert_eq!(a.replies.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_date_min_update() {
        let (_file, source) = source_with(sample_json());
        let mut filter = MessageFilter::new("/ops");
        filter.date_min_update = Some(35.0);

        let batch = source.fetch(&filter).await.unwrap();
        assert_eq!(ids(&batch), vec!["a"]);
    }

    #[tokio::test]
    async fn test_fetch_skip_and_limit() {
        let (_file, source) = source_with(sample_json());
        let mut filter = MessageFilter::new("");
        filter.limit = 1;
        filter.skip = 1;

        let batch = source.fetch(&filter).await.unwrap();
        assert_eq!(ids(&batch), vec!["c"]);
    }

    #[tokio::test]
    async fn test_fetch_overlay_text_and_label() {
        let (_file, source) = source_with(sample_json());

        let mut filter = MessageFilter::new("/ops");
        filter.overlay.insert("text".to_string(), "DISK".to_string());
        assert_eq!(ids(&source.fetch(&filter).await.unwrap()), vec!["a"]);

        let mut filter = MessageFilter::new("/ops");
        filter.overlay.insert("label".to_string(), "UP".to_string());
        assert_eq!(ids(&source.fetch(&filter).await.unwrap()), vec!["b"]);
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let source = FileSource::new("/nonexistent/path/messages.json");
        let err = source.fetch(&MessageFilter::new("/ops")).await.unwrap_err();
        assert!(matches!(err, SourceError::Read(_)));
        assert!(err.to_string().contains("Read error"));
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let (_file, source) = source_with("not valid json");
        let err = source.fetch(&MessageFilter::new("/ops")).await.unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
