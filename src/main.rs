use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dashingview::app::{App, View};
use dashingview::config::{Overrides, Settings};
use dashingview::poller::TickOutcome;
use dashingview::presenter::{BoardReceiver, WatchPresenter};
use dashingview::{events, ui, FileSource, Poller, SharedFilter};

#[derive(Parser, Debug)]
#[command(name = "dashingview")]
#[command(about = "Terminal dashboard for tagged monitoring messages")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON dump of the message list endpoint to serve messages from
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Topic to watch
    #[arg(short, long)]
    topic: Option<String>,

    /// Poll interval (e.g., "5s", "500ms", "5000")
    #[arg(short, long)]
    refresh: Option<String>,

    /// Messages requested per poll
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Write logs to this file (the terminal belongs to the TUI)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Fetch once, export the board to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let overrides = Overrides {
        topic: args.topic.clone(),
        file: args.file.clone(),
        refresh: args.refresh.clone(),
        count: args.count,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    let filter = SharedFilter::new(settings.filter.clone());
    let (presenter, receiver) = WatchPresenter::create();
    let poller = Poller::new(
        settings.topic.clone(),
        Arc::new(FileSource::new(&settings.source_file)),
        Arc::new(filter.clone()),
        Arc::new(settings.topic_provider()),
        Arc::new(presenter),
    )
    .with_tree_view(settings.tree_view.clone());

    let rt = tokio::runtime::Runtime::new()?;

    // Handle export mode (non-interactive)
    if let Some(export_path) = args.export {
        return export_to_file(&rt, &poller, &receiver, &export_path);
    }

    rt.block_on(poller.start())?;
    let app = App::new(poller.clone(), filter, receiver);
    let result = run_tui(app);
    poller.stop();
    result
}

/// RUST_LOG filter, defaulting to info. Logs go to `--log-file` in TUI mode
/// and to stderr in export mode; without a log file the TUI runs silent.
fn init_logging(args: &Args) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(ref path) = args.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if args.export.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        app.reload_data();

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(0, area.height / 2 - 2, area.width, 5);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);
            match app.current_view {
                View::Board | View::Alerts => ui::board::render(frame, app, chunks[2]),
            }
            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_detail_overlay {
                ui::detail::render_overlay(frame, app, area);
            }
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    // Content starts after header (1) + tabs (1) + table border (1)
                    events::handle_mouse_event(app, mouse, 3);
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Fetch once, classify and write the board as pretty JSON
fn export_to_file(
    rt: &tokio::runtime::Runtime,
    poller: &Poller,
    receiver: &BoardReceiver,
    export_path: &Path,
) -> Result<()> {
    let outcome = rt.block_on(async {
        poller.load_settings().await?;
        Ok::<_, anyhow::Error>(poller.tick().await)
    })?;
    if let TickOutcome::Failed(err) = outcome {
        return Err(err).context("Fetching messages failed");
    }

    let board = receiver.board.borrow().clone();
    let json = serde_json::to_string_pretty(&board.export())?;
    std::fs::write(export_path, json)?;

    info!("Exported {} messages", board.tiles.len());
    println!("Exported board to: {}", export_path.display());
    Ok(())
}
