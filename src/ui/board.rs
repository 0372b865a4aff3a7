//! Board and Alerts views.
//!
//! Both views draw the same table: one row per message, styled by its
//! status class unless directives gave it a custom style.

use std::time::Duration;

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_age;
use crate::data::{MessageFields, Scalar, WidgetConfig, WidgetKind};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Cells in a text progress bar.
const BAR_WIDTH: usize = 10;

/// Render the table of the current view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let tiles = app.visible_tiles();

    let block = Block::default()
        .title(title(app, tiles.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if tiles.is_empty() {
        let text = if app.board.initial_loading {
            "  Loading messages..."
        } else if app.current_view == View::Alerts {
            "  No alerts"
        } else {
            "  No messages"
        };
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(text, Style::default().add_modifier(Modifier::DIM))),
        ])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Status"),
        Cell::from("Message"),
        Cell::from("Service"),
        Cell::from("Widget"),
        Cell::from("Box"),
        Cell::from("Updated"),
    ])
    .height(1)
    .style(app.theme.header);

    let now = chrono::Utc::now().timestamp() as f64;
    let rows: Vec<Row> = tiles
        .iter()
        .map(|tile| {
            let config = &tile.config;
            let message = tile.handle.read();
            let row_style = app.theme.message_style(config.status_class, &config.style);
            let service = match (message.service(), message.item()) {
                (Some(service), Some(item)) => format!("{}/{}", service, item),
                (Some(service), None) => service.to_string(),
                _ => "-".to_string(),
            };

            Row::new(vec![
                Cell::from(config.status_class.symbol())
                    .style(app.theme.status_style(config.status_class)),
                Cell::from(config.text.clone()),
                Cell::from(service),
                Cell::from(widget_cell(config)),
                Cell::from(config.order_box.to_string()),
                Cell::from(age(now, message.date_update)),
            ])
            .style(row_style)
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Fill(4),
        Constraint::Fill(1),
        Constraint::Length(16),
        Constraint::Length(4),
        Constraint::Length(8),
    ];

    let selected = app.selected_index.min(tiles.len().saturating_sub(1));
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(table, area, &mut state);
}

fn title(app: &App, shown: usize) -> String {
    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };
    let position_info = if shown > 0 {
        format!(" [{}/{}]", app.selected_index.min(shown - 1) + 1, shown)
    } else {
        String::new()
    };
    format!(
        " {} ({}/{}){}{} ",
        app.current_view.label(),
        shown,
        app.board.tiles.len(),
        filter_info,
        position_info
    )
}

fn age(now: f64, date: f64) -> String {
    if date <= 0.0 {
        return "-".to_string();
    }
    format_age(Duration::from_secs_f64((now - date).max(0.0)))
}

/// Short text rendering of a widget for a table cell.
pub fn widget_cell(config: &WidgetConfig) -> String {
    match &config.widget {
        WidgetKind::ProgressBar => {
            let text = config
                .widget_value_text
                .as_ref()
                .map(Scalar::to_string)
                .unwrap_or_default();
            match config.percent() {
                Some(percent) => format!("{} {}%", progress_bar(percent), text),
                None => text,
            }
        }
        kind if kind.is_chart() => {
            let first_row = config
                .chart
                .as_ref()
                .and_then(|chart| chart.series.rows().into_iter().next());
            match first_row {
                Some(row) => sparkline(row),
                None => kind.label().to_string(),
            }
        }
        _ => match (&config.widget_value, &config.value) {
            (Some(value), _) | (None, Some(value)) => value.to_string(),
            (None, None) => "-".to_string(),
        },
    }
}

/// `█████░░░░░` for 50%.
pub fn progress_bar(percent: u16) -> String {
    let filled = (usize::from(percent.min(100)) * BAR_WIDTH + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Sparkline of the integer points of `values`, scaled between their
/// minimum and maximum. Non-integer points are skipped.
pub fn sparkline(values: &[Scalar]) -> String {
    let points: Vec<i128> = values
        .iter()
        .filter_map(Scalar::as_int)
        .map(i128::from)
        .collect();
    let (Some(&min), Some(&max)) = (points.iter().min(), points.iter().max()) else {
        return String::new();
    };
    let span = (max - min).max(1) as f64;
    points
        .iter()
        .map(|&v| {
            let level = (((v - min) as f64 / span) * 7.0).round() as usize;
            SPARKLINE_CHARS[level.min(7)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{classify, Message};

    fn config_for(labels: &[&str]) -> WidgetConfig {
        let message = labels
            .iter()
            .fold(Message::new("1", 1.0, 1.0), |m, text| m.with_label(text, "#000000"));
        classify(&message)
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), "░░░░░░░░░░");
        assert_eq!(progress_bar(50), "█████░░░░░");
        assert_eq!(progress_bar(100), "██████████");
        assert_eq!(progress_bar(250), "██████████");
    }

    #[test]
    fn test_sparkline() {
        let values = vec![Scalar::Int(0), Scalar::Int(7), Scalar::Text("x".into())];
        assert_eq!(sparkline(&values), "▁█");
        assert_eq!(sparkline(&[Scalar::Int(3), Scalar::Int(3)]), "▁▁");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn test_extreme_values_render() {
        let chart = config_for(&[
            "widget:line",
            "widget-data-serie:-9223372036854775808,0,9223372036854775807",
        ]);
        assert_eq!(widget_cell(&chart), "▁▅█");

        let progress = config_for(&[
            "percentRunning:0",
            "widget-min:-9223372036854775808",
            "widget-max:9223372036854775807",
            "widget-value:9223372036854775807",
        ]);
        assert_eq!(progress.percent(), Some(100));
        assert!(widget_cell(&progress).starts_with("██████████"));
    }

    #[test]
    fn test_widget_cell_progress() {
        let config = config_for(&["percentRunning:40"]);
        assert_eq!(widget_cell(&config), "████░░░░░░ 40%");
    }

    #[test]
    fn test_widget_cell_empty_progress_shows_zero() {
        let config = config_for(&["percentRunning:0"]);
        assert_eq!(widget_cell(&config), "██████████ 0%");
    }

    #[test]
    fn test_widget_cell_chart_and_value() {
        let chart = config_for(&["widget:line", "widget-data-serie:1,5,9"]);
        assert_eq!(widget_cell(&chart), "▁▅█");

        let value = config_for(&["value:42"]);
        assert_eq!(widget_cell(&value), "42");

        assert_eq!(widget_cell(&WidgetConfig::default()), "-");
    }

    #[test]
    fn test_age() {
        assert_eq!(age(100.0, 40.0), "1m");
        assert_eq!(age(100.0, 0.0), "-");
        assert_eq!(age(100.0, 200.0), "0s");
    }
}
