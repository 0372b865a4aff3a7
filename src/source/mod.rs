//! Message source abstraction and the collaborators that shape a fetch.
//!
//! A [`MessageSource`] answers one filtered page of messages per call. The
//! [`FilterProvider`] contributes an ambient overlay to every filter and the
//! [`TopicProvider`] supplies per-topic poll settings.

mod channel;
mod file;
mod filter;
mod topic;

pub use channel::{ChannelSource, FetchRequest};
pub use file::FileSource;
pub use filter::{FilterOverlay, FilterProvider, MessageFilter, SharedFilter};
pub use topic::{StaticTopics, TopicProvider, TopicSettings};

use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

use crate::data::MessageBatch;

/// Errors that can occur while fetching messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Reading the backing store failed.
    #[error("Read error: {0}")]
    Read(String),

    /// The payload could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The backend answered with an error.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The other side of a channel went away.
    #[error("Source closed: {0}")]
    Closed(String),
}

/// Trait for fetching pages of messages from a backend.
///
/// Implementations must be cheap to share: the poller holds them behind an
/// `Arc` and calls `fetch` from spawned tasks.
///
/// # Example
///
/// ```no_run
/// use dashingview::{FileSource, MessageFilter, MessageSource};
///
/// # tokio_test::block_on(async {
/// let source = FileSource::new("messages.json");
/// let filter = MessageFilter::new("/Internal/Alerts");
/// let batch = source.fetch(&filter).await.unwrap();
/// println!("Got {} messages", batch.messages.len());
/// # });
/// ```
#[async_trait]
pub trait MessageSource: Send + Sync + Debug {
    /// Fetch one page of messages matching `filter`.
    async fn fetch(&self, filter: &MessageFilter) -> Result<MessageBatch, SourceError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI header.
    fn description(&self) -> &str;
}
