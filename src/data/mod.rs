//! Message model, merge engine and widget classification.
//!
//! ## Submodules
//!
//! - [`message`]: Wire types ([`Message`], [`Label`], [`MessageBatch`])
//! - [`store`]: Canonical id-indexed list with stable handles and the merge
//! - [`directive`]: Label directive parser producing a [`WidgetConfig`]
//! - [`status`]: Status class and default order box from status labels
//! - [`chart`]: Chart label/series accumulation for `widget-data-*`
//! - [`widget`]: The derived [`WidgetConfig`] value types
//! - [`duration`]: Poll interval parsing and age formatting
//!
//! ## Data Flow
//!
//! ```text
//! MessageBatch (raw JSON)
//!        │
//!        ▼
//! MessageList::merge()  ──▶ HighWaterMark (next dateMinUpdate)
//!        │
//!        ▼
//! directive::classify() per message
//!        │
//!        └──▶ WidgetConfig (style, widget, chart, status, order)
//! ```

pub mod chart;
pub mod directive;
pub mod duration;
pub mod message;
pub mod status;
pub mod store;
pub mod widget;

pub use directive::{classify, sanitize_text};
pub use message::{Author, Label, Message, MessageBatch, MessageFields};
pub use store::{HighWaterMark, MergeSummary, MessageHandle, MessageList, StoredMessage};
pub use widget::{ChartData, ChartSeries, Scalar, StatusClass, StyleMap, WidgetConfig, WidgetKind};
