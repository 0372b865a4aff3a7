//! Message records as served by the Tat backend.
//!
//! These types match the JSON produced by the backend's message list
//! endpoint. Every collection field defaults to empty so that partial
//! payloads (for example replies without their own replies) deserialize.

use serde::{Deserialize, Serialize};

/// A colored label attached to a message.
///
/// The label text may carry a rendering directive (see [`super::directive`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    #[serde(default)]
    pub color: String,
}

impl Label {
    pub fn new(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: color.into(),
        }
    }
}

/// Author of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub fullname: String,
}

/// A message as received from a [`MessageSource`](crate::source::MessageSource).
///
/// Dates are epoch seconds with a fractional part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub topic: String,
    #[serde(rename = "inReplyOfID", default, skip_serializing_if = "Option::is_none")]
    pub in_reply_of_id: Option<String>,
    #[serde(rename = "inReplyOfIDRoot", default, skip_serializing_if = "Option::is_none")]
    pub in_reply_of_id_root: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub likers: Vec<String>,
    #[serde(default)]
    pub nb_likes: i64,
    #[serde(default)]
    pub nb_replies: i64,
    #[serde(default)]
    pub date_creation: f64,
    #[serde(default)]
    pub date_update: f64,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub replies: Vec<Message>,
}

impl Message {
    /// Create a bare message, mostly useful for tests and fixtures.
    pub fn new(id: impl Into<String>, date_creation: f64, date_update: f64) -> Self {
        Self {
            id: id.into(),
            date_creation,
            date_update,
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_label(mut self, text: &str, color: &str) -> Self {
        self.labels.push(Label::new(text, color));
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reply(mut self, reply: Message) -> Self {
        self.replies.push(reply);
        self
    }
}

/// One page of messages returned by a fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBatch {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub is_topic_rw: bool,
}

/// Read-only view over the fields shared by wire messages and stored
/// messages, so classification and tag helpers are written once.
pub trait MessageFields {
    fn text(&self) -> &str;
    fn tags(&self) -> &[String];
    fn labels(&self) -> &[Label];
    fn reply_root(&self) -> Option<&str>;

    /// True for monitoring messages: `#monitoring #<service> #item:<item>`.
    fn is_monitoring(&self) -> bool {
        let tags = self.tags();
        tags.len() >= 3 && tags[0] == "monitoring" && tags[2].starts_with("item:")
    }

    /// The service name, carried by the second tag.
    fn service(&self) -> Option<&str> {
        self.tags().get(1).map(String::as_str)
    }

    /// Value of the first `item:` tag. Later `item:` tags are ignored.
    fn item(&self) -> Option<&str> {
        self.tags().iter().find_map(|t| t.strip_prefix("item:"))
    }

    /// True if a root message carries a label with exactly this text.
    fn contains_label(&self, text: &str) -> bool {
        if self.reply_root().is_some() {
            return false;
        }
        self.labels().iter().any(|l| l.text == text)
    }
}

impl MessageFields for Message {
    fn text(&self) -> &str {
        &self.text
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn labels(&self) -> &[Label] {
        &self.labels
    }

    fn reply_root(&self) -> Option<&str> {
        self.in_reply_of_id_root.as_deref()
    }
}
