//! Channel-based message source.
//!
//! Forwards each fetch as a request over a tokio channel and waits for the
//! answer. This lets a backend client living elsewhere in the process (an
//! HTTP client task, a test harness) serve the poller.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::{MessageFilter, MessageSource, SourceError};
use crate::data::MessageBatch;

/// A pending fetch, answered through `reply`.
#[derive(Debug)]
pub struct FetchRequest {
    pub filter: MessageFilter,
    pub reply: oneshot::Sender<Result<MessageBatch, SourceError>>,
}

/// A message source that hands fetches to whoever holds the request
/// receiver.
///
/// # Example
///
/// ```
/// use dashingview::{ChannelSource, MessageBatch};
///
/// # tokio_test::block_on(async {
/// let (mut requests, source) = ChannelSource::create("tat://localhost");
/// tokio::spawn(async move {
///     while let Some(request) = requests.recv().await {
///         let _ = request.reply.send(Ok(MessageBatch::default()));
///     }
/// });
/// # });
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    requests: mpsc::Sender<FetchRequest>,
    description: String,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `requests` - The sending end of the request channel
    /// * `source_description` - Where answers come from
    ///   (e.g., "tat://localhost")
    pub fn new(requests: mpsc::Sender<FetchRequest>, source_description: &str) -> Self {
        let description = format!("channel: {}", source_description);
        Self {
            requests,
            description,
        }
    }

    /// Create a request channel and a source feeding it.
    ///
    /// Returns (receiver, source): the receiver yields one [`FetchRequest`]
    /// per fetch.
    pub fn create(source_description: &str) -> (mpsc::Receiver<FetchRequest>, Self) {
        let (tx, rx) = mpsc::channel(16);
        (rx, Self::new(tx, source_description))
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn fetch(&self, filter: &MessageFilter) -> Result<MessageBatch, SourceError> {
        let (reply, answer) = oneshot::channel();
        let request = FetchRequest {
            filter: filter.clone(),
            reply,
        };
        self.requests
            .send(request)
            .await
            .map_err(|_| SourceError::Closed("request channel closed".to_string()))?;
        answer
            .await
            .map_err(|_| SourceError::Closed("request dropped without answer".to_string()))?
    }

    fn description(&self) -> &str {
        &self.description
    }
}
