use std::fs::File;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tokio::sync::mpsc;

use cloudscope_logs::{LogStore, load_events, load_file};
use cloudscope_tui::{
    Action, AppState, ContextMenu, Event, EventHandler, HelpOverlay, KeyBindings, KeyContext,
    LogViewerScreen, Settings, Tui,
};
use cloudscope_types::GroupingMode;

/// Cloudscope - A terminal UI for browsing serverless function logs
#[derive(Parser, Debug)]
#[command(name = "cloudscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Exported log events (JSON array or JSON Lines); reads stdin when omitted
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Initial grouping: none, stream or invocation
    #[arg(short, long)]
    grouping: Option<GroupingMode>,

    /// Settings file (defaults to ./cloudscope.toml or the user config dir)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Keep whole groups visible when any of their lines match the filter
    #[arg(long)]
    group_filter: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for debugging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Run the application
    let result = run_app(args).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match args.config.clone().or_else(Settings::default_path) {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    if let Some(mode) = args.grouping {
        settings.default_grouping = mode;
    }
    if args.group_filter {
        settings.group_filter = true;
    }
    Ok(settings)
}

fn load_store(args: &Args, capacity: usize) -> Result<(LogStore, String)> {
    let store = LogStore::new(capacity);
    let (events, source) = match &args.file {
        Some(path) => (
            load_file(path).with_context(|| format!("Failed to load {}", path.display()))?,
            path.display().to_string(),
        ),
        None => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                anyhow::bail!("No log file given and nothing piped on stdin");
            }
            (
                load_events(stdin.lock()).context("Failed to read log events from stdin")?,
                "stdin".to_string(),
            )
        }
    };
    let loaded = store.extend(events).len();
    tracing::info!(loaded, retained = store.len(), "log events loaded");
    Ok((store, source))
}

async fn run_app(args: Args) -> Result<()> {
    let settings = load_settings(&args)?;
    let (store, source) = load_store(&args, settings.capacity)?;

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Initialize state
    let mut state = AppState::new(store, settings);

    // Initialize TUI
    let mut tui = Tui::new()?;

    // Initialize event handler
    let mut events = EventHandler::new(Duration::from_millis(250));

    // Initialize keybindings
    let keybindings = KeyBindings::new();

    // Initial render
    render(&mut tui, &mut state, &source)?;

    // Main event loop
    loop {
        tokio::select! {
            // Handle terminal events
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let action = if state.ui_state.context_menu.visible {
                            keybindings.get_action(KeyContext::ContextMenu, &key)
                        } else if state.ui_state.find.open {
                            keybindings.get_find_input_action(&key)
                        } else {
                            keybindings.get_action(KeyContext::LogViewer, &key)
                        };
                        if let Some(action) = action {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Mouse(mouse) => {
                        state.handle_mouse(mouse);
                    }
                    Event::Tick => {}
                    Event::Resize(_, _) => {
                        let _ = action_tx.send(Action::Render);
                    }
                    Event::Error(e) => {
                        state.show_error(e);
                        state.render_dirty = true;
                    }
                }
            }

            // Handle user actions
            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &source, action);
            }
        }

        if state.should_quit {
            break;
        }

        if state.render_dirty {
            render(&mut tui, &mut state, &source)?;
        }
    }

    // Cleanup
    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn handle_action(state: &mut AppState, source: &str, action: Action) {
    match action {
        Action::ExportLogs => {
            let stem = Path::new(source)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("logs");
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            let filename = format!("{}_{}.log", stem, timestamp);

            match export_logs_to_file(&filename, state) {
                Ok(count) => {
                    state.set_status(format!("Exported {} logs to {}", count, filename));
                }
                Err(e) => {
                    state.show_error(format!("Export failed: {:#}", e));
                }
            }
            state.render_dirty = true;
        }
        other => state.update(other),
    }
}

fn export_logs_to_file(filename: &str, state: &AppState) -> Result<usize> {
    let text = state.export_text();
    let count = state.projection().log_count_in_view();
    let mut file = File::create(filename).with_context(|| format!("Cannot create {}", filename))?;
    file.write_all(text.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(count)
}

fn render(tui: &mut Tui, state: &mut AppState, source: &str) -> Result<()> {
    tui.terminal().draw(|frame| {
        LogViewerScreen::render(frame, state, source);

        // Render context menu overlay if visible
        ContextMenu::render(frame, &mut state.ui_state.context_menu);

        // Render help overlay if visible
        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }

        if let Some(msg) = &state.ui_state.error_message {
            render_error(frame, msg);
        }
    })?;
    state.render_dirty = false;

    Ok(())
}

fn render_error(frame: &mut Frame, msg: &str) {
    let area = frame.area();
    let width = 60.min(area.width.saturating_sub(4));
    let height = 5.min(area.height);
    let popup = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, popup);
    let body = Paragraph::new(vec![
        Line::from(Span::styled(msg.to_string(), Style::default().fg(Color::White))),
        Line::from(Span::styled("[Esc] Dismiss", Style::default().fg(Color::DarkGray))),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(Span::styled(
                " Error ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
    );
    frame.render_widget(body, popup);
}
