mod api;
mod app;
mod cli;
mod event;
mod feed;
mod help;
mod keys;
mod likes;
mod logging;
mod playback;
mod session;
mod settings;
mod surface;
mod theme;
mod time;
mod tui;
mod views;

#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{DefaultTerminal, Frame, layout::Rect};
use tracing::{info, warn};

use api::{DEFAULT_API_BASE, FeedClient};
use app::{App, Message};
use cli::{Cli, Commands};
use event::Event;
use settings::Settings;
use theme::{Theme, ThemeVariant, detect_terminal_variant};
use tui::EventHandler;

const TICK_MS: u64 = 100;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = settings::config_dir(cli.config_dir.as_ref());

    match &cli.command {
        Some(Commands::Path) => {
            print_paths(config_dir.as_ref());
            return Ok(());
        }
        Some(Commands::Peek { count }) => {
            let settings = load_settings(config_dir.as_ref());
            let client = build_client(&cli, &settings)?;
            let page = client
                .fetch_feed(*count)
                .await
                .with_context(|| format!("Failed to fetch feed from {}", client.base()))?;
            let json =
                serde_json::to_string_pretty(&page).context("Failed to serialize feed page")?;
            println!("{json}");
            return Ok(());
        }
        None => {}
    }

    run_tui(cli, config_dir).await
}

fn print_paths(config_dir: Option<&PathBuf>) {
    match config_dir {
        Some(dir) => {
            println!("settings: {}", settings::settings_path(dir).display());
            println!("log:      {}", settings::log_path(dir).display());
        }
        None => eprintln!("Could not determine config directory"),
    }
}

fn load_settings(config_dir: Option<&PathBuf>) -> Settings {
    config_dir
        .map(|dir| {
            let path = settings::settings_path(dir);
            Settings::load(&path).unwrap_or_else(|e| {
                eprintln!("Warning: {}", e);
                Settings::default()
            })
        })
        .unwrap_or_default()
}

fn build_client(cli: &Cli, settings: &Settings) -> Result<FeedClient> {
    // Priority: CLI --api-base > settings file > default
    let base = cli
        .api_base
        .as_deref()
        .or(settings.api_base.as_deref())
        .unwrap_or(DEFAULT_API_BASE);
    let timeout = settings
        .request_timeout()
        .unwrap_or(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    FeedClient::new(base, timeout)
}

fn resolve_theme(cli: &Cli, settings: &Settings) -> Theme {
    let variant = if cli.dark {
        ThemeVariant::Dark
    } else if cli.light {
        ThemeVariant::Light
    } else if let Some(variant) = settings.theme {
        variant
    } else {
        detect_terminal_variant()
    };
    Theme::for_variant(variant)
}

async fn run_tui(cli: Cli, config_dir: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(config_dir.as_ref());

    if let Some(dir) = &config_dir {
        let log_path = settings::log_path(dir);
        match logging::init(&log_path, cli.verbose) {
            Ok(()) if cli.verbose => eprintln!("Logging to {}", log_path.display()),
            Ok(()) => {}
            Err(e) => eprintln!("Logging disabled: {}", e),
        }
    }

    let client = build_client(&cli, &settings)?;
    let max_items = cli.max_items.map(|n| n as usize);
    let config = settings.session_config(max_items);
    let autoplay = settings.autoplay.unwrap_or_default();
    let theme = resolve_theme(&cli, &settings);
    info!(base = client.base(), max_items = config.max_items, ?autoplay, "starting");

    let mut terminal = tui::init()?;
    let mut app = App::new(client, config, autoplay, theme);
    let mut events = EventHandler::new(TICK_MS);

    let outcome = event_loop(&mut terminal, &mut app, &mut events).await;

    if let Some(session) = app.session.as_mut() {
        session.teardown();
    }
    tui::restore()?;
    if let Err(e) = &outcome {
        warn!(error = %e, "event loop ended with error");
    }
    outcome
}

async fn event_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<()> {
    let mut last_rows: Option<u16> = None;

    loop {
        // The feed pane shrinks when the debug pane opens, so recompute its
        // height every frame rather than only on terminal resize.
        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        let rows = views::split(area, app.show_debug).feed.height;
        if last_rows != Some(rows) {
            last_rows = Some(rows);
            app.update(Message::Resize(rows));
        }

        terminal.draw(|frame| render(app, frame))?;

        // Poll async results (non-blocking)
        while let Ok(result) = app.result_rx.try_recv() {
            app.handle_async_result(result);
        }

        if app.should_quit {
            return Ok(());
        }

        match events.next().await? {
            Event::Key(key) => {
                if let Some(msg) = keys::handle_key(key, app) {
                    app.update(msg);
                }
            }
            Event::Tick => app.update(Message::Tick),
            Event::Resize => {}
        }
    }
}

fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();
    let panes = views::split(area, app.show_debug);

    views::feed::render(frame, app, panes.feed);
    views::status_bar::render(frame, app, panes.status);

    if let Some(debug_area) = panes.debug {
        views::debug::render(frame, app, debug_area);
    }

    views::help_overlay::render(frame, app, area);
}
