//! Per-topic poll settings.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use super::SourceError;

/// How often and how much to poll for one topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicSettings {
    pub interval: Duration,
    /// Page size sent as the filter `limit`
    pub count: usize,
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            count: 150,
        }
    }
}

/// Supplies poll settings for a topic, fetched once before polling starts.
#[async_trait]
pub trait TopicProvider: Send + Sync {
    async fn settings(&self, topic: &str) -> Result<TopicSettings, SourceError>;
}

/// Settings known up front, typically from the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticTopics {
    default: TopicSettings,
    topics: HashMap<String, TopicSettings>,
}

impl StaticTopics {
    pub fn new(default: TopicSettings) -> Self {
        Self {
            default,
            topics: HashMap::new(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>, settings: TopicSettings) -> Self {
        self.topics.insert(topic.into(), settings);
        self
    }
}

#[async_trait]
impl TopicProvider for StaticTopics {
    async fn settings(&self, topic: &str) -> Result<TopicSettings, SourceError> {
        Ok(self.topics.get(topic).copied().unwrap_or(self.default))
    }
}
