mod app;
mod components;
mod config;
mod error;
mod event;
mod handler;
mod picker;
mod service;
mod theme;
mod tree;
mod tui;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig, LogConfig, ServiceConfig};
use crate::error::AppError;
use crate::event::{Event, EventHandler};
use crate::picker::PickerOptions;
use crate::service::fixture::Fixture;
use crate::service::spawn_fetch;
use crate::tui::{install_panic_hook, Tui};

/// Browse a lazily loaded folder tree and pick an upload target.
#[derive(Parser, Debug)]
#[command(name = "fp", version, about)]
struct Cli {
    /// JSON fixture with namespaces and folders (defaults to a built-in demo tree)
    fixture: Option<PathBuf>,

    /// Namespace to open first
    #[arg(short, long)]
    namespace: Option<String>,

    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Artificial delay for every folder listing, in milliseconds
    #[arg(long)]
    latency_ms: Option<u64>,

    /// Disable mouse support
    #[arg(long)]
    no_mouse: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Partial config holding only the values given on the command line.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
                namespace: self.namespace.clone(),
                fixture: self.fixture.as_ref().map(|p| p.display().to_string()),
            },
            service: ServiceConfig {
                latency_ms: self.latency_ms,
            },
            log: LogConfig {
                file: self.log_file.as_ref().map(|p| p.display().to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Send logs to the configured file. The terminal belongs to the UI, so
/// without a file nothing is logged.
fn init_logging(config: &AppConfig) -> error::Result<()> {
    let Some(path) = config.log_file() else {
        return Ok(());
    };
    let file = File::options().create(true).append(true).open(&path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| AppError::Config(format!("logging: {}", e)))?;
    Ok(())
}

/// Hand every queued fetch to the runtime; answers come back as events.
fn dispatch_fetches(app: &mut App, event_tx: &mpsc::UnboundedSender<Event>) {
    let requests = app.take_fetches();
    if requests.is_empty() {
        return;
    }
    let Some(service) = app.service() else {
        warn!(namespace = %app.picker.namespace(), "no service for namespace");
        return;
    };
    for request in requests {
        spawn_fetch(service.clone(), request, event_tx.clone());
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    init_logging(&config)?;

    let fixture = match config.fixture_path() {
        Some(path) => Fixture::load(&path)?,
        None => Fixture::demo(),
    };
    let options = PickerOptions {
        typeahead_timeout: config.typeahead_timeout(),
        page_size: config.page_size(),
        scoped_search: config.scoped_search(),
    };
    let mut app = App::new(&fixture, config.namespace(), config.latency(), options)?;
    let theme = theme::resolve_theme(&config.theme);
    info!(namespace = %app.picker.namespace(), "starting picker");

    install_panic_hook();

    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(16));
    let event_tx = events.sender();
    app.picker.set_sink(Box::new(event_tx.clone()));

    loop {
        dispatch_fetches(&mut app, &event_tx);
        tui.draw(|frame| ui::render(&mut app, frame, &theme))?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
            Event::FetchComplete(response) => app.handle_fetch(response),
            Event::SelectionChanged(target) => app.handle_selection(target),
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;

    // The chosen folder is the program's output.
    if let Some(target) = app.picker.selected_target() {
        match serde_json::to_string_pretty(&target) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "could not encode selection"),
        }
    }
    Ok(())
}
