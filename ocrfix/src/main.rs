//! ocrfix: review and correct OCR text segments in the terminal.
//!
//! Entry point for the `ocrfix` binary. Wires together the terminal lifecycle
//! (`tui`), unified event bus (`event`), UI (`ui`), theme system (`theme`) and the
//! review session from `ocrfix-core`.
//!
//! # Startup sequence
//!
//! 1. Parse flags, start file logging under `.ocrfix/`, load the config file.
//! 2. Open the gateway: the review server when a URL is configured, otherwise the
//!    local SQLite store. `--import` loads segments into the store and exits.
//! 3. `install_panic_hook()`, `register_sigterm()`, `init_tui()`.
//! 4. Spawn the event task and the gateway worker; start the session.
//!
//! On exit the terminal is restored first, then the session is closed: unresolved
//! segments are released and queued gateway calls get `SHUTDOWN_GRACE` to finish.
//!
//! `?` is only used before `init_tui()`. After that, errors break out of the loop so
//! `restore_tui()` always runs.

mod app;
mod config;
mod event;
mod logging;
mod theme;
mod tui;
mod ui;

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use ocrfix_core::gateway::http::HttpGateway;
use ocrfix_core::gateway::sqlite::SqliteGateway;
use ocrfix_core::gateway::worker::spawn_gateway_worker;
use ocrfix_core::{db, NewSegment, ReviewGateway, SessionController};

use crate::config::Config;
use crate::ui::keybindings::{self, KeyAction};

const STATE_DIR: &str = ".ocrfix";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "ocrfix", version, about = "Review and correct OCR text segments")]
struct Args {
    /// SQLite store to review from (ignored when a server is set)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Base URL of the review server, e.g. http://localhost:5000
    #[arg(long)]
    server: Option<String>,

    /// Import segments from a JSON array into the local store, then exit
    #[arg(long, value_name = "JSON")]
    import: Option<PathBuf>,

    /// Segments claimed per fetch from the local store
    #[arg(long)]
    page_size: Option<usize>,

    /// Color theme: dark or catppuccin-mocha
    #[arg(long)]
    theme: Option<String>,
}

impl Args {
    /// Overrides config values with the flags that were given.
    fn apply(&self, config: &mut Config) {
        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
        if let Some(server) = &self.server {
            config.server_url = Some(server.clone());
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(theme) = &self.theme {
            config.theme = theme.clone();
        }
    }
}

fn io_err(e: impl std::error::Error + Send + Sync + 'static) -> std::io::Error {
    std::io::Error::other(e)
}

async fn open_store(path: &Path) -> std::io::Result<tokio_rusqlite::Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    db::open_db(path).await.map_err(io_err)
}

/// Loads a JSON array of segments into the store and reports how many were new.
async fn import(config: &Config, file: &Path) -> std::io::Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let segments: Vec<NewSegment> = serde_json::from_str(&raw).map_err(io_err)?;
    let total = segments.len();
    let conn = open_store(&config.db_path).await?;
    let inserted = db::import_segments(&conn, segments).await.map_err(io_err)?;
    tracing::info!(file = %file.display(), inserted, total, "imported segments");
    println!("imported {inserted} of {total} segments into {}", config.db_path.display());
    Ok(())
}

async fn open_gateway(config: &Config) -> std::io::Result<Arc<dyn ReviewGateway>> {
    match &config.server_url {
        Some(url) => {
            tracing::info!(server = %url, "reviewing against server");
            let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
            Ok(Arc::new(HttpGateway::new(url.clone(), timeout).map_err(io_err)?))
        }
        None => {
            tracing::info!(db = %config.db_path.display(), "reviewing local store");
            let conn = open_store(&config.db_path).await?;
            let lease = Duration::from_secs(config.claim_lease_secs);
            Ok(Arc::new(SqliteGateway::new(conn, config.page_size, lease)))
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init_logging(Path::new(STATE_DIR))?;

    let mut config = config::load_config();
    args.apply(&mut config);

    if let Some(file) = &args.import {
        return import(&config, file).await;
    }

    let gateway = open_gateway(&config).await?;
    let theme = theme::Theme::from_name(&config.theme);
    let auto_retry = (config.auto_retry_secs > 0).then(|| Duration::from_secs(config.auto_retry_secs));
    let mut state = app::AppState::new(auto_retry);

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let (commands, worker) = spawn_gateway_worker(gateway, event::gateway_sink(handler.tx.clone()));
    let mut rx = handler.rx;

    let mut controller = SessionController::new(commands);
    controller.start();

    let mut exit_error: Option<std::io::Error> = None;

    // Exits only via `break` so `restore_tui()` below is always reached.
    'event_loop: loop {
        tokio::select! {
            // Heartbeat: SIGTERM is checked at least every 50ms even when idle.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event::AppEvent::Render) => {
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &controller, &theme)) {
                            exit_error = Some(e);
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Key(key)) => {
                        if keybindings::handle_key(key, &mut state, &mut controller) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Mouse(mouse)) => keybindings::handle_mouse(mouse, &mut state),
                    Some(event::AppEvent::Gateway(reply)) => {
                        controller.apply(*reply);
                        state.after_reply(&controller, Instant::now());
                    }
                    Some(event::AppEvent::Tick) => {
                        if state.on_tick(Instant::now()) {
                            tracing::info!("retrying failed fetch");
                            controller.retry_prefetch();
                        }
                    }
                    // ratatui picks up the new size from `frame.area()` on the next render.
                    Some(event::AppEvent::Resize(_, _)) => {}
                    Some(event::AppEvent::Quit) | None => break 'event_loop,
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    let restored = tui::restore_tui();

    // Saves and skips already dispatched must reach the backend before the runtime drops.
    let session = controller.session_id();
    if !controller.close(worker, SHUTDOWN_GRACE).await {
        eprintln!("ocrfix: some review decisions may not have been recorded (see .ocrfix/ocrfix.log)");
    }
    tracing::info!(%session, "review session ended");

    restored?;
    match exit_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
