//! Fetch filters and the ambient filter overlay.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

/// Extra key/value constraints merged on top of every outgoing filter.
pub type FilterOverlay = BTreeMap<String, String>;

/// Overlay keys that count as an explicit date filter.
const DATE_KEYS: &[&str] = &[
    "dateMinCreation",
    "dateMaxCreation",
    "dateMinUpdate",
    "dateMaxUpdate",
];

/// Parameters of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageFilter {
    pub topic: String,
    pub tree_view: String,
    pub only_msg_root: bool,
    pub limit: usize,
    pub skip: usize,
    /// Only messages updated at or after this date (epoch seconds)
    pub date_min_update: Option<f64>,
    pub overlay: FilterOverlay,
}

impl MessageFilter {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            tree_view: "notree".to_string(),
            only_msg_root: true,
            limit: 150,
            skip: 0,
            date_min_update: None,
            overlay: FilterOverlay::new(),
        }
    }

    /// Flatten into backend query parameters.
    ///
    /// Overlay entries win over the core fields with the same key.
    pub fn to_query(&self) -> BTreeMap<String, String> {
        let mut query = BTreeMap::new();
        query.insert("topic".to_string(), self.topic.clone());
        query.insert("treeView".to_string(), self.tree_view.clone());
        query.insert("onlyMsgRoot".to_string(), self.only_msg_root.to_string());
        query.insert("limit".to_string(), self.limit.to_string());
        query.insert("skip".to_string(), self.skip.to_string());
        if let Some(date) = self.date_min_update {
            query.insert("dateMinUpdate".to_string(), date.to_string());
        }
        query.extend(self.overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
        query
    }
}

/// Supplies the ambient overlay merged into every outgoing filter.
pub trait FilterProvider: Send + Sync + Debug {
    fn overlay(&self) -> FilterOverlay;

    /// True when the overlay already constrains dates, in which case the
    /// poller does not add its own `dateMinUpdate`.
    fn contains_date_filter(&self) -> bool {
        self.overlay()
            .keys()
            .any(|k| DATE_KEYS.contains(&k.as_str()))
    }
}

/// A cloneable, shared overlay that the UI edits while the poller reads it.
#[derive(Debug, Clone, Default)]
pub struct SharedFilter {
    inner: Arc<RwLock<FilterOverlay>>,
}

impl SharedFilter {
    pub fn new(initial: FilterOverlay) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Set `key`, or remove it when `value` is empty.
    pub fn set(&self, key: &str, value: &str) {
        let mut overlay = self.inner.write();
        if value.is_empty() {
            overlay.remove(key);
        } else {
            overlay.insert(key.to_string(), value.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().get(key).cloned()
    }

    pub fn replace(&self, overlay: FilterOverlay) {
        *self.inner.write() = overlay;
    }
}

impl FilterProvider for SharedFilter {
    fn overlay(&self) -> FilterOverlay {
        self.inner.read().clone()
    }
}
