//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use chrono::Local;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_age;
use crate::data::StatusClass;

/// Clock format shown in the header.
pub const DATE_FORMAT: &str = "%Y/%m/%d-%H:%M";

/// Render the header bar: overall status, counts per class, topic and clock.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let topic = if app.topic().is_empty() {
        "(all topics)"
    } else {
        app.topic()
    };
    let clock = Local::now().format(DATE_FORMAT).to_string();

    if app.board.initial_loading {
        let line = Line::from(vec![
            Span::styled(" DASHINGVIEW ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("│ {} │ Loading... │ {}", topic, clock)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let counts = app.board.counts();
    let overall = if counts.danger > 0 {
        StatusClass::Danger
    } else if counts.warning > 0 {
        StatusClass::Warning
    } else {
        StatusClass::Success
    };

    let count_span = |n: usize, status: StatusClass| {
        if n > 0 {
            Span::styled(n.to_string(), app.theme.status_style(status))
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        }
    };

    let mut spans = vec![
        Span::styled(" ● ", app.theme.status_style(overall)),
        Span::styled("DASHINGVIEW ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        count_span(counts.success, StatusClass::Success),
        Span::raw(" up "),
        count_span(counts.warning, StatusClass::Warning),
        Span::raw(" warn "),
        count_span(counts.danger, StatusClass::Danger),
        Span::raw(" al │ "),
        Span::styled(topic.to_string(), Style::default().add_modifier(Modifier::BOLD)),
    ];
    if !app.board.is_topic_rw {
        spans.push(Span::styled(" (ro)", Style::default().add_modifier(Modifier::DIM)));
    }
    spans.push(Span::raw(format!(" │ {}", clock)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let alerts = app.board.counts().danger;
    let titles: Vec<Line> = vec![
        Line::from(" 1:Board "),
        Line::from(format!(" 2:Alerts ({}) ", alerts)),
    ];

    let selected = match app.current_view {
        View::Board => 0,
        View::Alerts => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the last fetch error when there is one, otherwise the source,
/// time since the last board and the available controls.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(ref err) = app.load_error {
        let paragraph = Paragraph::new(format!(" Error: {} | r:refresh q:quit", err))
            .style(app.theme.status_style(StatusClass::Danger));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.filter_active {
        "Type to filter | Enter:apply Esc:cancel"
    } else {
        "/:filter Tab:switch Enter:detail r:refresh e:export ?:help q:quit"
    };

    let status = match app.board.updated_at {
        Some(updated_at) => {
            let elapsed = (Local::now() - updated_at).to_std().unwrap_or_default();
            let loading = if app.board.loading { " (fetching)" } else { "" };
            format!(
                " {} | Updated {} ago{} | {}",
                app.source_description(),
                format_age(elapsed),
                loading,
                controls
            )
        }
        None => format!(" {} | Loading... | {}", app.source_description(), controls),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab/1/2     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Message detail"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        section(" Filter"),
        Line::from("  /           Edit text filter"),
        Line::from("  c           Clear filter"),
        Line::from(""),
        section(" General"),
        Line::from("  r           Refresh from scratch"),
        Line::from("  e           Export board to JSON"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 23u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
