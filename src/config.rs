//! Layered configuration.
//!
//! Sources, lowest precedence first: an optional TOML file, then
//! `DASHINGVIEW_*` environment variables (nested keys use `__`, e.g.
//! `DASHINGVIEW_POLL__INTERVAL=10s`), then command-line overrides.
//!
//! ```toml
//! topic = "/Internal/Alerts"
//!
//! [source]
//! file = "messages.json"
//!
//! [poll]
//! interval = "5s"
//! count = 150
//! tree_view = "notree"
//!
//! [filter]
//! label = "AL"
//!
//! [topics."/internal/fast"]
//! interval = "1s"
//! count = 50
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::data::duration::parse_interval;
use crate::source::{FilterOverlay, StaticTopics, TopicSettings};

/// Errors raised while assembling [`Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A duration value did not parse.
    #[error("Invalid interval for {key}: {value}")]
    Interval { key: String, value: String },
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPoll {
    interval: Option<String>,
    count: Option<usize>,
    tree_view: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTopic {
    interval: Option<String>,
    count: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    source: RawSource,
    #[serde(default)]
    poll: RawPoll,
    #[serde(default)]
    filter: FilterOverlay,
    #[serde(default)]
    topics: HashMap<String, RawTopic>,
}

/// Command-line values that win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub topic: Option<String>,
    pub file: Option<PathBuf>,
    pub refresh: Option<String>,
    pub count: Option<usize>,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub topic: String,
    pub source_file: PathBuf,
    pub tree_view: String,
    /// Poll settings for topics without their own entry
    pub poll: TopicSettings,
    /// Initial filter overlay
    pub filter: FilterOverlay,
    pub topics: HashMap<String, TopicSettings>,
}

impl Settings {
    /// Load from `path` (if any), the environment and `overrides`.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("DASHINGVIEW")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("topic", overrides.topic.clone())?
            .set_override_option(
                "source.file",
                overrides
                    .file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .set_override_option("poll.interval", overrides.refresh.clone())?
            .set_override_option("poll.count", overrides.count.map(|c| c as u64))?
            .build()?;

        let raw: RawSettings = config.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let defaults = TopicSettings::default();
        let poll = TopicSettings {
            interval: interval("poll.interval", raw.poll.interval.as_deref())?
                .unwrap_or(defaults.interval),
            count: raw.poll.count.unwrap_or(defaults.count),
        };

        let mut topics = HashMap::new();
        for (name, topic) in raw.topics {
            let key = format!("topics.{}.interval", name);
            let settings = TopicSettings {
                interval: interval(&key, topic.interval.as_deref())?.unwrap_or(poll.interval),
                count: topic.count.unwrap_or(poll.count),
            };
            topics.insert(name, settings);
        }

        Ok(Self {
            topic: raw.topic.unwrap_or_default(),
            source_file: raw
                .source
                .file
                .unwrap_or_else(|| PathBuf::from("messages.json")),
            tree_view: raw.poll.tree_view.unwrap_or_else(|| "notree".to_string()),
            poll,
            filter: raw.filter,
            topics,
        })
    }

    /// Topic settings as a [`TopicProvider`](crate::source::TopicProvider).
    pub fn topic_provider(&self) -> StaticTopics {
        self.topics
            .iter()
            .fold(StaticTopics::new(self.poll), |provider, (name, settings)| {
                provider.with_topic(name.clone(), *settings)
            })
    }
}

fn interval(key: &str, value: Option<&str>) -> Result<Option<std::time::Duration>, ConfigError> {
    value
        .map(|v| {
            parse_interval(v).map_err(|_| ConfigError::Interval {
                key: key.to_string(),
                value: v.to_string(),
            })
        })
        .transpose()
}
