//! Canonical message store and incremental merge.
//!
//! Each poll returns a partial snapshot of the topic's message tree. The
//! [`MessageList`] folds those snapshots into one list in which every
//! message id maps to a single [`MessageHandle`] for the life of the list.
//! Updates are written through the handle, so anything holding a handle
//! (the board, the detail overlay) always sees the latest state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::message::{Author, Label, Message, MessageFields};

/// Shared, stable reference to a message in the canonical list.
pub type MessageHandle = Arc<RwLock<StoredMessage>>;

/// Largest `dateUpdate` seen on inserted messages.
///
/// Sent back to the backend as `dateMinUpdate` so that only newer
/// messages are returned. It never moves backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HighWaterMark(Option<f64>);

impl HighWaterMark {
    pub fn new() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<f64> {
        self.0
    }

    pub fn advance(&mut self, date_update: f64) {
        match self.0 {
            Some(current) if current >= date_update => {}
            _ => self.0 = Some(date_update),
        }
    }

    pub fn reset(&mut self) {
        self.0 = None;
    }
}

/// Counts of what a merge did, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl MergeSummary {
    fn absorb(&mut self, other: MergeSummary) {
        self.inserted += other.inserted;
        self.updated += other.updated;
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.updated == 0
    }
}

/// A message owned by the canonical list.
///
/// Mirrors [`Message`], except that replies are themselves a
/// [`MessageList`] so that reply identity is preserved at every depth.
#[derive(Debug)]
pub struct StoredMessage {
    pub id: String,
    pub text: String,
    pub topic: String,
    pub in_reply_of_id: Option<String>,
    pub in_reply_of_id_root: Option<String>,
    pub tags: Vec<String>,
    pub labels: Vec<Label>,
    pub likers: Vec<String>,
    pub nb_likes: i64,
    pub nb_replies: i64,
    pub date_creation: f64,
    pub date_update: f64,
    pub author: Author,
    pub replies: MessageList,
}

impl StoredMessage {
    /// A new message arrives with its whole reply subtree; only the
    /// caller's own `date_update` moves the high-water mark.
    fn insert(mut message: Message) -> (Self, MergeSummary) {
        let mut replies = MessageList::new();
        let mut subtree_mark = HighWaterMark::new();
        let summary = replies.merge(std::mem::take(&mut message.replies), &mut subtree_mark);
        let stored = Self {
            id: message.id,
            text: message.text,
            topic: message.topic,
            in_reply_of_id: message.in_reply_of_id,
            in_reply_of_id_root: message.in_reply_of_id_root,
            tags: message.tags,
            labels: message.labels,
            likers: message.likers,
            nb_likes: message.nb_likes,
            nb_replies: message.nb_replies,
            date_creation: message.date_creation,
            date_update: message.date_update,
            author: message.author,
            replies,
        };
        (stored, summary)
    }

    /// Overwrite the mutable fields from a newer copy of the same message.
    ///
    /// Creation date, topic, author and reply linkage are fixed at insert.
    fn update(&mut self, mut incoming: Message, mark: &mut HighWaterMark) -> MergeSummary {
        let summary = self.replies.merge(std::mem::take(&mut incoming.replies), mark);
        self.labels = incoming.labels;
        self.likers = incoming.likers;
        self.nb_likes = incoming.nb_likes;
        self.nb_replies = incoming.nb_replies;
        self.date_update = incoming.date_update;
        self.text = incoming.text;
        self.tags = incoming.tags;
        summary
    }

    /// Owned snapshot of this message and its replies.
    pub fn to_message(&self) -> Message {
        Message {
            id: self.id.clone(),
            text: self.text.clone(),
            topic: self.topic.clone(),
            in_reply_of_id: self.in_reply_of_id.clone(),
            in_reply_of_id_root: self.in_reply_of_id_root.clone(),
            tags: self.tags.clone(),
            labels: self.labels.clone(),
            likers: self.likers.clone(),
            nb_likes: self.nb_likes,
            nb_replies: self.nb_replies,
            date_creation: self.date_creation,
            date_update: self.date_update,
            author: self.author.clone(),
            replies: self.replies.iter().map(|r| r.read().to_message()).collect(),
        }
    }
}

impl MessageFields for StoredMessage {
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

/// Ordered, id-indexed list of messages with stable handles.
///
/// Kept sorted by `dateCreation`, newest first. Entries with equal creation
/// dates keep their arrival order, but callers should not rely on it.
#[derive(Debug, Default)]
pub struct MessageList {
    entries: Vec<MessageHandle>,
    index: HashMap<String, MessageHandle>,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handle at a position in creation order.
    pub fn get(&self, position: usize) -> Option<&MessageHandle> {
        self.entries.get(position)
    }

    /// Handle for a message id.
    pub fn find(&self, id: &str) -> Option<&MessageHandle> {
        self.index.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MessageHandle> {
        self.entries.iter()
    }

    pub fn handles(&self) -> &[MessageHandle] {
        &self.entries
    }

    /// Drop every message. Only a full refresh does this.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Fold an incoming batch into the list.
    ///
    /// Known ids are updated in place and their replies merged recursively.
    /// New ids are inserted and advance `mark`. The list is sorted again
    /// before returning whenever something was inserted.
    pub fn merge(&mut self, source: Vec<Message>, mark: &mut HighWaterMark) -> MergeSummary {
        let mut summary = MergeSummary::default();
        if source.is_empty() {
            return summary;
        }

        for incoming in source {
            if let Some(existing) = self.index.get(&incoming.id) {
                let nested = existing.write().update(incoming, mark);
                summary.updated += 1;
                summary.absorb(nested);
            } else {
                mark.advance(incoming.date_update);
                let (stored, nested) = StoredMessage::insert(incoming);
                let handle = Arc::new(RwLock::new(stored));
                self.index.insert(handle.read().id.clone(), Arc::clone(&handle));
                self.entries.push(handle);
                summary.inserted += 1;
                summary.absorb(nested);
            }
        }

        if summary.inserted > 0 {
            self.sort();
        }
        summary
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| {
            let a = a.read().date_creation;
            let b = b.read().date_creation;
            b.total_cmp(&a)
        });
    }

    /// Owned snapshot of the whole list.
    pub fn to_messages(&self) -> Vec<Message> {
        self.entries.iter().map(|h| h.read().to_message()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creation_dates(list: &MessageList) -> Vec<f64> {
        list.iter().map(|h| h.read().date_creation).collect()
    }

    #[test]
    fn test_merge_into_empty_list() {
        let mut list = MessageList::new();
        let mut mark = HighWaterMark::new();

        let summary = list.merge(vec![Message::new("1", 10.0, 5.0)], &mut mark);

        assert_eq!(summary, MergeSummary { inserted: 1, updated: 0 });
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().read().id, "1");
        assert_eq!(mark.get(), Some(5.0));
    }

    #[test]
    fn test_merge_empty_source_is_noop() {
        let mut list = MessageList::new();
        let mut mark = HighWaterMark::new();
        list.merge(vec![Message::new("1", 10.0, 5.0)], &mut mark);

        let summary = list.merge(Vec::new(), &mut mark);
        assert!(summary.is_empty());
        assert_eq!(list.len(), 1);
        assert_eq!(mark.get(), Some(5.0));
    }

    #[test]
    fn test_update_preserves_identity() {
        let mut list = MessageList::new();
        let mut mark = HighWaterMark::new();

        list.merge(vec![Message::new("1", 10.0, 5.0).with_label("WARN", "#ff0")], &mut mark);
        let first = Arc::clone(list.get(0).unwrap());

        let summary = list.merge(
            vec![Message::new("1", 10.0, 8.0).with_label("UP", "#0f0").with_text("recovered")],
            &mut mark,
        );

        assert_eq!(summary, MergeSummary { inserted: 0, updated: 1 });
        assert_eq!(list.len(), 1);
        let second = list.get(0).unwrap();
        assert!(Arc::ptr_eq(&first, second));

        let stored = first.read();
        assert_eq!(stored.labels, vec![Label::new("UP", "#0f0")]);
        assert_eq!(stored.text, "recovered");
        assert_eq!(stored.date_update, 8.0);
    }

    #[test]
    fn test_updates_do_not_advance_high_water_mark() {
        let mut list = MessageList::new();
        let mut mark = HighWaterMark::new();

        list.merge(vec![Message::new("1", 10.0, 5.0)], &mut mark);
        list.merge(vec![Message::new("1", 10.0, 50.0)], &mut mark);

        assert_eq!(mark.get(), Some(5.0));
    }

    #[test]
    fn test_high_water_mark_never_decreases() {
        let mut list = MessageList::new();
        let mut mark = HighWaterMark::new();

        list.merge(vec![Message::new("1", 1.0, 20.0), Message::new("2", 2.0, 3.0)], &mut mark);

        assert_eq!(mark.get(), Some(20.0));
    }

    #[test]
    fn test_insertions_sorted_newest_first() {
        let mut list = MessageList::new();
        let mut mark = HighWaterMark::new();

        list.merge(vec![Message::new("a", 5.0, 1.0)], &mut mark);
        list.merge(vec![Message::new("b", 10.0, 1.0)], &mut mark);
        list.merge(vec![Message::new("c", 7.0, 1.0)], &mut mark);

        assert_eq!(creation_dates(&list), vec![10.0, 7.0, 5.0]);
    }

    #[test]
    fn test_batch_insertions_sorted() {
        let mut list = MessageList::new();
        let mut mark = HighWaterMark::new();

        list.merge(
            vec![
                Message::new("a", 5.0, 1.0),
                Message::new("b", 10.0, 1.0),
                Message::new("c", 7.0, 1.0),
            ],
            &mut mark,
        );

        assert_eq!(creation_dates(&list), vec![10.0, 7.0, 5.0]);
        assert!(list.find("c").is_some());
    }

    #[test]
    fn test_replies_merged_recursively() {
        let mut list = MessageList::new();
        let mut mark = HighWaterMark::new();

        let root = Message::new("root", 10.0, 10.0)
            .with_reply(Message::new("r1", 11.0, 11.0).with_reply(Message::new("rr1", 12.0, 12.0)));
        list.merge(vec![root], &mut mark);
        // Replies shipped with a new root do not move the mark
        assert_eq!(mark.get(), Some(10.0));

        let reply = Arc::clone(list.get(0).unwrap().read().replies.find("r1").unwrap());
        let nested = Arc::clone(reply.read().replies.find("rr1").unwrap());

        let update = Message::new("root", 10.0, 20.0).with_reply(
            Message::new("r1", 11.0, 21.0)
                .with_text("edited")
                .with_reply(Message::new("rr1", 12.0, 22.0).with_label("done", "#0f0"))
                .with_reply(Message::new("rr2", 13.0, 23.0)),
        );
        let summary = list.merge(vec![update], &mut mark);

        assert_eq!(summary, MergeSummary { inserted: 1, updated: 3 });

        let root = list.get(0).unwrap().read();
        let same_reply = root.replies.find("r1").unwrap();
        assert!(Arc::ptr_eq(&reply, same_reply));
        assert_eq!(same_reply.read().text, "edited");

        let reply = same_reply.read();
        assert!(Arc::ptr_eq(&nested, reply.replies.find("rr1").unwrap()));
        assert_eq!(nested.read().labels[0].text, "done");
        // Nested replies are kept newest first too
        let ids: Vec<String> = reply.replies.iter().map(|h| h.read().id.clone()).collect();
        assert_eq!(ids, vec!["rr2", "rr1"]);
        // A reply inserted under an existing message advances the mark
        assert_eq!(mark.get(), Some(23.0));
    }

    #[test]
    fn test_duplicate_ids_in_one_batch_update_first_insert() {
        let mut list = MessageList::new();
        let mut mark = HighWaterMark::new();

        list.merge(
            vec![
                Message::new("1", 10.0, 1.0).with_text("first"),
                Message::new("1", 10.0, 2.0).with_text("second"),
            ],
            &mut mark,
        );

        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().read().text, "second");
    }

    #[test]
    fn test_clear_and_snapshot() {
        let mut list = MessageList::new();
        let mut mark = HighWaterMark::new();
        list.merge(
            vec![Message::new("1", 1.0, 1.0).with_reply(Message::new("2", 2.0, 2.0))],
            &mut mark,
        );

        let snapshot = list.to_messages();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].replies[0].id, "2");

        list.clear();
        assert!(list.is_empty());
        assert!(list.find("1").is_none());
    }
}
