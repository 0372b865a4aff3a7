//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::poller::Poller;
use crate::presenter::{Board, BoardReceiver, Tile};
use crate::source::SharedFilter;
use crate::ui::Theme;

/// Overlay key the search box writes to.
pub const TEXT_FILTER_KEY: &str = "text";

/// The current view/tab in the TUI.
///
/// Message detail is shown as an overlay (controlled by
/// `App::show_detail_overlay`) rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Every message, by order box then newest first.
    Board,
    /// Danger messages only.
    Alerts,
}

impl View {
    /// Cycle to the other view.
    pub fn next(self) -> Self {
        match self {
            View::Board => View::Alerts,
            View::Alerts => View::Board,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Board => "Board",
            View::Alerts => "Alerts",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    poller: Poller,
    filter: SharedFilter,
    receiver: BoardReceiver,
    pub board: Board,
    pub load_error: Option<String>,

    pub selected_index: usize,

    // Search box, pushed into the filter overlay on Enter
    pub filter_text: String,
    pub filter_active: bool,

    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App over a poller and the receiving side of its presenter.
    pub fn new(poller: Poller, filter: SharedFilter, receiver: BoardReceiver) -> Self {
        let filter_text = filter.get(TEXT_FILTER_KEY).unwrap_or_default();
        let board = receiver.board.borrow().clone();
        Self {
            running: true,
            current_view: View::Board,
            show_help: false,
            show_detail_overlay: false,
            poller,
            filter,
            receiver,
            board,
            load_error: None,
            selected_index: 0,
            filter_text,
            filter_active: false,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    pub fn source_description(&self) -> &str {
        self.poller.source_description()
    }

    pub fn topic(&self) -> &str {
        self.poller.topic()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Pick up the latest board and error from the poller.
    ///
    /// Returns true if the board changed.
    pub fn reload_data(&mut self) -> bool {
        if self.receiver.error.has_changed().unwrap_or(false) {
            self.load_error = self
                .receiver
                .error
                .borrow_and_update()
                .as_ref()
                .map(|e| e.to_string());
        }

        if !self.receiver.board.has_changed().unwrap_or(false) {
            return false;
        }
        let selected_id = self.selected_tile().map(Tile::id);
        self.board = self.receiver.board.borrow_and_update().clone();

        // Keep the cursor on the same message when it moved
        let tiles = self.visible_tiles();
        let position = selected_id.and_then(|id| tiles.iter().position(|t| t.id() == id));
        let max = tiles.len().saturating_sub(1);
        self.selected_index = position.unwrap_or(self.selected_index).min(max);
        true
    }

    /// Tiles of the current view, in display order.
    pub fn visible_tiles(&self) -> Vec<&Tile> {
        match self.current_view {
            View::Board => self.board.ordered(),
            View::Alerts => self.board.alerts(),
        }
    }

    pub fn selected_tile(&self) -> Option<&Tile> {
        self.visible_tiles().get(self.selected_index).copied()
    }

    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.selected_index = 0;
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_next_n(&mut self, n: usize) {
        let max = self.visible_tiles().len().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.visible_tiles().len().saturating_sub(1);
    }

    /// Open the detail overlay for the selected message.
    pub fn enter_detail(&mut self) {
        if self.selected_tile().is_some() {
            self.show_detail_overlay = true;
        }
    }

    /// Navigate back: close the overlay first, then return to the board.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
        } else if self.current_view != View::Board {
            self.set_view(View::Board);
        }
    }

    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode, restoring the text that is currently applied.
    pub fn cancel_filter(&mut self) {
        self.filter_text = self.filter.get(TEXT_FILTER_KEY).unwrap_or_default();
        self.filter_active = false;
    }

    /// Push the search text into the filter overlay and refetch everything.
    pub fn apply_filter(&mut self) {
        self.filter_active = false;
        let applied = self.filter.get(TEXT_FILTER_KEY).unwrap_or_default();
        if applied == self.filter_text {
            return;
        }
        self.filter.set(TEXT_FILTER_KEY, &self.filter_text);
        self.refresh();
    }

    /// Clear the search text and refetch if a filter was applied.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.apply_filter();
    }

    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
    }

    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Drop every message and restart polling from scratch.
    pub fn refresh(&mut self) {
        self.poller.refresh();
        self.selected_index = 0;
        self.show_detail_overlay = false;
        self.reload_data();
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current board to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        if self.board.initial_loading {
            anyhow::bail!("No data to export");
        }
        let json = serde_json::to_string_pretty(&self.board.export())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
