//! Detail overlay rendering.
//!
//! Displays a modal overlay with everything known about the selected
//! message: its labels, the widget configuration they produced, chart data
//! and replies.

use chrono::{DateTime, Local};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::{ChartData, Scalar, StoredMessage, WidgetConfig};
use crate::ui::board::sparkline;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;

/// Render the message detail as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }
    let Some(tile) = app.selected_tile() else {
        return;
    };
    let message = tile.handle.read();
    let config = &tile.config;

    let overlay_width = (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, 110);
    let overlay_height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 50);
    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Length(7), // Message header
        Constraint::Min(6),    // Widget + replies
        Constraint::Length(1), // Footer
    ])
    .split(overlay_area);

    // ===== HEADER =====
    let status_style = app.theme.status_style(config.status_class);
    let mut label_spans = vec![Span::raw(" Labels: ")];
    for label in &message.labels {
        label_spans.push(Span::styled(
            format!(" {} ", label.text),
            app.theme.label_style(&label.color),
        ));
        label_spans.push(Span::raw(" "));
    }
    if message.labels.is_empty() {
        label_spans.push(Span::styled("none", Style::default().add_modifier(Modifier::DIM)));
    }

    let header_lines = vec![
        Line::from(vec![Span::styled(
            format!(" {} ", config.text),
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(vec![
            Span::raw(" Status: "),
            Span::styled(config.status_class.symbol(), status_style),
            Span::raw(format!("    Box: {}", config.order_box)),
            Span::raw(format!(
                "    Likes: {}    Replies: {}",
                message.nb_likes, message.nb_replies
            )),
        ]),
        Line::from(format!(
            " By {}    Created {}    Updated {}",
            author(&message),
            format_date(message.date_creation),
            format_date(message.date_update)
        )),
        Line::from(format!(" Tags: {}", message.tags.join(" "))),
        Line::from(label_spans),
    ];

    let header = Paragraph::new(header_lines).block(
        Block::default()
            .title(format!(" Message {} ", message.id))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.highlight)),
    );
    frame.render_widget(header, chunks[0]);

    // ===== WIDGET + REPLIES =====
    let content = Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    let widget = Paragraph::new(widget_lines(config))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(format!(" Widget: {} ", config.widget.label()))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        );
    frame.render_widget(widget, content[0]);

    let mut reply_lines = Vec::new();
    for reply in message.replies.iter() {
        let reply = reply.read();
        reply_lines.push(Line::from(vec![
            Span::styled(
                format!(" {} ", author(&reply)),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format_date(reply.date_creation),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]));
        reply_lines.push(Line::from(format!("   {}", reply.text)));
    }
    if reply_lines.is_empty() {
        reply_lines.push(Line::from(Span::styled(
            "  No replies",
            Style::default().add_modifier(Modifier::DIM),
        )));
    }
    let replies = Paragraph::new(reply_lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(format!(" Replies ({}) ", message.replies.len()))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        );
    frame.render_widget(replies, content[1]);

    // ===== FOOTER =====
    let mut footer = vec![Span::styled(
        " Press Esc to close ",
        Style::default().add_modifier(Modifier::DIM),
    )];
    if let Some(ref url) = config.url {
        footer.push(Span::styled(
            format!("│ {}", url),
            Style::default().fg(app.theme.highlight),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(footer)), chunks[2]);
}

fn author(message: &StoredMessage) -> &str {
    if message.author.fullname.is_empty() {
        &message.author.username
    } else {
        &message.author.fullname
    }
}

fn format_date(epoch: f64) -> String {
    if epoch <= 0.0 {
        return "-".to_string();
    }
    let millis = (epoch * 1000.0) as i64;
    DateTime::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&Local).format("%Y/%m/%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn optional(value: &Option<Scalar>) -> String {
    value
        .as_ref()
        .map(Scalar::to_string)
        .unwrap_or_else(|| "-".to_string())
}

/// Text lines describing a widget configuration.
fn widget_lines(config: &WidgetConfig) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(format!(
        " min {}  max {}  value {}  text {}{}",
        optional(&config.widget_min),
        optional(&config.widget_max),
        optional(&config.widget_value),
        optional(&config.widget_value_text),
        if config.complete { "  (complete)" } else { "" },
    ))];

    if let Some(ref value) = config.value {
        lines.push(Line::from(format!(" Value: {}", value)));
    }
    if config.widget_mode.is_some() || config.widget_class.is_some() {
        lines.push(Line::from(format!(
            " Mode: {}  Class: {}",
            config.widget_mode.as_deref().unwrap_or("-"),
            config.widget_class.as_deref().unwrap_or("-"),
        )));
    }
    for (name, style) in [
        ("Style", &config.style),
        ("Title", &config.title_style),
        ("Value", &config.value_style),
    ] {
        if !style.is_empty() {
            lines.push(Line::from(format!(" {}: {}", name, style.render())));
        }
    }
    if config.hide_bottom {
        lines.push(Line::from(" Bottom hidden"));
    }
    if !config.options.is_empty() {
        let options = serde_json::Value::Object(config.options.clone());
        lines.push(Line::from(format!(" Options: {}", options)));
    }
    if let Some(ref chart) = config.chart {
        lines.extend(chart_lines(chart, config.legend_names.as_deref()));
    }
    lines
}

fn chart_lines(chart: &ChartData, legend: Option<&[String]>) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(format!(" Labels: {}", chart.labels.join(", "))),
    ];
    for (i, row) in chart.series.rows().into_iter().enumerate() {
        let name = legend
            .and_then(|names| names.get(i))
            .cloned()
            .unwrap_or_else(|| format!("#{}", i + 1));
        let points: Vec<String> = row.iter().map(Scalar::to_string).collect();
        lines.push(Line::from(format!(
            " {:<10} {}  {}",
            name,
            sparkline(row),
            points.join(" ")
        )));
    }
    lines
}
