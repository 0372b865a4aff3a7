//! # dashingview
//!
//! A terminal dashboard and library for monitoring tagged messages.
//!
//! Messages carry labels that double as rendering directives
//! (`percentRunning:40`, `bg-color`, `widget-data-series:1,2,3`, ...) and
//! status markers (`AL`, `WARN`, `UP`). This crate polls a message source,
//! merges each partial page into one identity-stable list and turns every
//! message into a [`WidgetConfig`] for display.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Application                            │
//! │  ┌─────────┐   ┌──────────┐   ┌───────────┐   ┌──────────────┐   │
//! │  │ source  │──▶│  poller  │──▶│ presenter │──▶│  app + ui    │   │
//! │  │ (fetch) │   │ (merge + │   │  (Board)  │   │ (ratatui)    │   │
//! │  └─────────┘   │ classify)│   └───────────┘   └──────┬───────┘   │
//! │       ▲        └──────────┘                          │           │
//! │       │                                              │           │
//! │  FileSource | ChannelSource        SharedFilter ◀────┘           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the [`MessageSource`] trait, filters and topic settings
//! - **[`data`]**: message model, the merge into [`MessageList`], the label
//!   directive parser and status classification
//! - **[`poller`]**: the fetch cycle with at most one fetch in flight
//! - **[`presenter`]**: [`Board`] snapshots published over watch channels
//! - **[`config`]**: layered TOML / environment / CLI settings
//! - **[`app`]**, **[`ui`]**: the interactive terminal UI
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a topic served from a JSON dump
//! dashingview --file messages.json --topic /Internal/Alerts --refresh 5s
//!
//! # One-shot export of the classified board
//! dashingview --file messages.json --export board.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use dashingview::{FileSource, Poller, SharedFilter, StaticTopics, TopicSettings, WatchPresenter};
//!
//! # tokio_test::block_on(async {
//! let (presenter, mut receiver) = WatchPresenter::create();
//! let poller = Poller::new(
//!     "/Internal/Alerts",
//!     Arc::new(FileSource::new("messages.json")),
//!     Arc::new(SharedFilter::default()),
//!     Arc::new(StaticTopics::new(TopicSettings::default())),
//!     Arc::new(presenter),
//! );
//! poller.start().await.unwrap();
//!
//! receiver.board.changed().await.unwrap();
//! for tile in receiver.board.borrow().ordered() {
//!     println!("{} {}", tile.config.status_class.symbol(), tile.config.text);
//! }
//! # });
//! ```
//!
//! ### Classifying a single message
//!
//! ```
//! use dashingview::{classify, Message, StatusClass, WidgetKind};
//!
//! let message = Message::new("1", 10.0, 10.0).with_label("percentRunning:0", "#000000");
//! let config = classify(&message);
//! assert_eq!(config.widget, WidgetKind::ProgressBar);
//! assert_eq!(config.status_class, StatusClass::Danger);
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod poller;
pub mod presenter;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use data::{
    classify, HighWaterMark, Label, Message, MessageBatch, MessageFields, MessageHandle,
    MessageList, StatusClass, WidgetConfig, WidgetKind,
};
pub use poller::Poller;
pub use presenter::{Board, Presenter, Tile, WatchPresenter};
pub use source::{
    ChannelSource, FileSource, FilterProvider, MessageFilter, MessageSource, SharedFilter,
    SourceError, StaticTopics, TopicProvider, TopicSettings,
};
