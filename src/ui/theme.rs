//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection, plus
//! the color rules used for status classes and message labels.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::{StatusClass, StyleMap};

/// Labels brighter than this get dark text.
const BRIGHTNESS_THRESHOLD: f64 = 128.0;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    pub warning: Color,
    pub danger: Color,
    pub success: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            danger: Color::Red,
            success: Color::Green,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Rgb(0xb3, 0x6b, 0x00),
            danger: Color::Red,
            success: Color::Rgb(0x14, 0x89, 0x2c),
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn status_color(&self, status: StatusClass) -> Color {
        match status {
            StatusClass::Success => self.success,
            StatusClass::Warning => self.warning,
            StatusClass::Danger => self.danger,
        }
    }

    /// Get style for a status class
    pub fn status_style(&self, status: StatusClass) -> Style {
        let style = Style::default().fg(self.status_color(status));
        match status {
            StatusClass::Danger => style.add_modifier(Modifier::BOLD),
            _ => style,
        }
    }

    /// Style for a message row: a custom `background-color`/`color` from
    /// directives wins over the status color.
    pub fn message_style(&self, status: StatusClass, style: &StyleMap) -> Style {
        let mut out = self.status_style(status);
        if let Some(bg) = style.get("background-color").and_then(parse_hex) {
            out = out.bg(bg).fg(readable_on(bg));
        }
        if let Some(fg) = style.get("color").and_then(parse_hex) {
            out = out.fg(fg);
        }
        out
    }

    /// Chip style for a label with the given hex color.
    pub fn label_style(&self, color: &str) -> Style {
        match parse_hex(color) {
            Some(bg) => Style::default().bg(bg).fg(readable_on(bg)),
            None => Style::default().fg(self.highlight),
        }
    }
}

/// True for a bare 3- or 6-digit hex color (no leading `#`).
pub fn is_hex(value: &str) -> bool {
    (value.len() == 3 || value.len() == 6) && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Parse `#rrggbb`, `rrggbb`, `#rgb` or `rgb`.
pub fn parse_hex(color: &str) -> Option<Color> {
    let hex = color.trim().trim_start_matches('#');
    if !is_hex(hex) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    if hex.len() == 3 {
        let mut rgb = [0u8; 3];
        for (i, c) in hex.chars().enumerate() {
            let v = channel(&c.to_string())?;
            rgb[i] = v * 17;
        }
        return Some(Color::Rgb(rgb[0], rgb[1], rgb[2]));
    }
    Some(Color::Rgb(
        channel(&hex[0..2])?,
        channel(&hex[2..4])?,
        channel(&hex[4..6])?,
    ))
}

/// Perceived brightness (0..=255) of a `#rrggbb` color; 0 when unparsable.
pub fn brightness(color: &str) -> f64 {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !is_hex(hex) {
        return 0.0;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).map(f64::from).unwrap_or(0.0);
    0.2126 * channel(&hex[0..2]) + 0.7152 * channel(&hex[2..4]) + 0.0722 * channel(&hex[4..6])
}

/// Black or white, whichever reads better on `bg`.
fn readable_on(bg: Color) -> Color {
    let luma = match bg {
        Color::Rgb(r, g, b) => 0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b),
        _ => 0.0,
    };
    if luma > BRIGHTNESS_THRESHOLD {
        Color::Black
    } else {
        Color::White
    }
}
