//! What the poller hands to the UI after each classification pass.

use std::cmp::Ordering;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::watch;

use crate::data::{classify, MessageHandle, MessageList, StatusClass, WidgetConfig};
use crate::source::SourceError;

/// One message and its freshly computed widget configuration.
#[derive(Debug, Clone)]
pub struct Tile {
    pub handle: MessageHandle,
    pub config: WidgetConfig,
}

impl Tile {
    pub fn new(handle: MessageHandle) -> Self {
        let config = classify(&*handle.read());
        Self { handle, config }
    }

    pub fn id(&self) -> String {
        self.handle.read().id.clone()
    }

    pub fn date_creation(&self) -> f64 {
        self.handle.read().date_creation
    }
}

/// Count of tiles per status class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub danger: usize,
    pub warning: usize,
    pub success: usize,
}

/// The classified canonical list plus the flags the UI gates on.
#[derive(Debug, Clone)]
pub struct Board {
    /// Tiles in canonical order (newest creation first).
    pub tiles: Vec<Tile>,
    pub initial_loading: bool,
    pub loading: bool,
    pub is_topic_rw: bool,
    pub updated_at: Option<DateTime<Local>>,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            tiles: Vec::new(),
            initial_loading: true,
            loading: false,
            is_topic_rw: false,
            updated_at: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedTile<'a> {
    id: String,
    date_creation: f64,
    date_update: f64,
    #[serde(flatten)]
    config: &'a WidgetConfig,
}

impl Board {
    /// Classify every message of `messages`.
    pub fn build(messages: &MessageList, is_topic_rw: bool) -> Self {
        Self {
            tiles: messages.iter().cloned().map(Tile::new).collect(),
            initial_loading: false,
            loading: false,
            is_topic_rw,
            updated_at: Some(Local::now()),
        }
    }

    /// Tiles by order box, then newest first.
    pub fn ordered(&self) -> Vec<&Tile> {
        let mut tiles: Vec<&Tile> = self.tiles.iter().collect();
        tiles.sort_by(|a, b| {
            a.config
                .order_box
                .cmp(&b.config.order_box)
                .then_with(|| {
                    b.date_creation()
                        .partial_cmp(&a.date_creation())
                        .unwrap_or(Ordering::Equal)
                })
        });
        tiles
    }

    /// Danger tiles only, in board order.
    pub fn alerts(&self) -> Vec<&Tile> {
        self.ordered()
            .into_iter()
            .filter(|t| t.config.status_class == StatusClass::Danger)
            .collect()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for tile in &self.tiles {
            match tile.config.status_class {
                StatusClass::Danger => counts.danger += 1,
                StatusClass::Warning => counts.warning += 1,
                StatusClass::Success => counts.success += 1,
            }
        }
        counts
    }

    /// JSON document of the board, in board order.
    pub fn export(&self) -> serde_json::Value {
        let tiles: Vec<ExportedTile<'_>> = self
            .ordered()
            .into_iter()
            .map(|tile| {
                let message = tile.handle.read();
                ExportedTile {
                    id: message.id.clone(),
                    date_creation: message.date_creation,
                    date_update: message.date_update,
                    config: &tile.config,
                }
            })
            .collect();

        serde_json::json!({
            "isTopicRw": self.is_topic_rw,
            "counts": self.counts(),
            "updatedAt": self.updated_at.map(|t| t.to_rfc3339()),
            "tiles": tiles,
        })
    }
}

/// Receives the results of each poll.
pub trait Presenter: Send + Sync {
    /// A new classified board is available.
    fn present(&self, board: Board);

    /// A fetch failed; `error` is the raw source error.
    fn display_error(&self, error: &SourceError);

    /// A fetch started or finished.
    fn set_loading(&self, _loading: bool) {}
}

/// Receiving side of a [`WatchPresenter`].
#[derive(Debug, Clone)]
pub struct BoardReceiver {
    pub board: watch::Receiver<Board>,
    pub error: watch::Receiver<Option<SourceError>>,
}

/// Publishes boards and errors over tokio watch channels.
///
/// A successful board clears the last error.
#[derive(Debug)]
pub struct WatchPresenter {
    board: watch::Sender<Board>,
    error: watch::Sender<Option<SourceError>>,
}

impl WatchPresenter {
    pub fn create() -> (Self, BoardReceiver) {
        let (board_tx, board_rx) = watch::channel(Board::default());
        let (error_tx, error_rx) = watch::channel(None);
        let presenter = Self {
            board: board_tx,
            error: error_tx,
        };
        let receiver = BoardReceiver {
            board: board_rx,
            error: error_rx,
        };
        (presenter, receiver)
    }
}

impl Presenter for WatchPresenter {
    fn present(&self, board: Board) {
        self.board.send_replace(board);
        self.error.send_replace(None);
    }

    fn display_error(&self, error: &SourceError) {
        self.error.send_replace(Some(error.clone()));
    }

    fn set_loading(&self, loading: bool) {
        self.board.send_modify(|board| board.loading = loading);
    }
}
