//! Terminal rendering with ratatui.

pub mod board;
pub mod common;
pub mod detail;
pub mod theme;

pub use theme::Theme;
