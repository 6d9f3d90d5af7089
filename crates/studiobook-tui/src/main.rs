//! Studiobook TUI - A terminal view of a studio's booked events.
//!
//! This application keeps the booked-events table in sync with the booking
//! sheet's script endpoint and shows the raw schedule alongside it.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use studiobook_core::{ApiClient, CacheManager, Config, EventCacheSync};

use app::{App, AppState, WatchRenderer};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file prefix inside `<cache_dir>/logs`
const LOG_FILE_PREFIX: &str = "studiobook.log";

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to a daily file; stderr would draw over the alternate screen
fn init_tracing(log_dir: PathBuf) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    guard
}

/// Headless commands log straight to stderr
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--sync-once") => {
            init_stderr_tracing();
            return sync_once(&config).await;
        }
        Some("--check-date") => {
            init_stderr_tracing();
            let date = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Usage: studiobook --check-date YYYY-MM-DD"))?;
            return check_date(&config, date).await;
        }
        Some("--set-endpoint") => {
            let url = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Usage: studiobook --set-endpoint URL"))?;
            // Environment overrides are not written back
            let mut on_disk = Config::load_file()?;
            on_disk.endpoint_url = Some(url.clone());
            on_disk.save()?;
            println!("Endpoint saved to {}", Config::config_path()?.display());
            return Ok(());
        }
        Some(other) if other.starts_with("--") => {
            anyhow::bail!("Unknown option: {}", other);
        }
        _ => {}
    }

    // Initialize logging
    let _log_guard = init_tracing(config.cache_dir()?.join("logs"));
    info!("Studiobook TUI starting");

    // Create app before touching the terminal so config errors print normally
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.start_background();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Studiobook TUI shutting down");
    Ok(())
}

/// Run one initialize cycle without a terminal and print what it rendered
async fn sync_once(config: &Config) -> Result<()> {
    let api = ApiClient::new(config.endpoint()?)?;
    let cache = CacheManager::new(config.cache_dir()?)?;
    let schedule_api = config.schedule_endpoint().map(|url| api.with_endpoint(url));

    let (renderer, rows) = WatchRenderer::new();
    let sync = EventCacheSync::new(Arc::new(api), cache, Arc::new(renderer), config.sync);

    let schedule = async {
        match schedule_api {
            Some(api) => Some(api.fetch_schedule().await),
            None => None,
        }
    };
    let (outcome, schedule) = futures::future::join(sync.initialize(), schedule).await;
    info!(?outcome, "Sync finished");

    for row in rows.borrow().iter() {
        println!("{}", row.display_line());
    }
    if let Some(msg) = sync.status().indicator.message() {
        eprintln!("{}", msg);
    }

    match schedule {
        Some(Ok(raw)) => eprintln!("Schedule: {} rows", raw.len()),
        Some(Err(e)) => {
            warn!(error = %e, "Schedule fetch failed");
            eprintln!("Schedule: Failed to load data");
        }
        None => {}
    }
    Ok(())
}

async fn check_date(config: &Config, date: &str) -> Result<()> {
    let api = ApiClient::new(config.endpoint()?)?;
    let booked = api
        .check_date(date)
        .await
        .context("Date availability check failed")?;
    if booked {
        println!("{} is already booked", date);
    } else {
        println!("{} is available", date);
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }

                    // Handle input
                    if handle_input(app, key)? {
                        return Ok(());
                    }
                }
                Event::FocusGained => app.set_visible(true),
                Event::FocusLost => app.set_visible(false),
                _ => {}
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
