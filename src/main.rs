mod app;
mod components;
mod config;
mod error;
mod event;
mod format;
mod fs;
mod handler;
mod logging;
mod navigator;
mod scroll;
mod tasks;
mod theme;
mod tui;
mod ui;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig, TreeConfig};
use crate::event::{Event, EventHandler};
use crate::fs::local::LocalProvider;
use crate::tasks::Dispatcher;
use crate::tui::{install_panic_hook, Tui};

/// A terminal file browser over a lazily loaded volume tree.
#[derive(Parser, Debug)]
#[command(name = "tnav", version, about)]
struct Cli {
    /// Path to open at startup (defaults to the configured startup path,
    /// or the bare volume list)
    path: Option<PathBuf>,

    /// Path to a config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable mouse support
    #[arg(long)]
    no_mouse: bool,

    /// Sort key: name, extension, size, or modified
    #[arg(long)]
    sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    /// Log level or filter directives (overridden by $TNAV_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory for the log file
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    /// Partial config built from flags; only flags actually given are `Some`.
    fn overrides(&self, startup_path: Option<String>) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                startup_path,
                mouse: self.no_mouse.then_some(false),
            },
            tree: TreeConfig {
                sort_by: self.sort.clone(),
                sort_direction: self.desc.then(|| "desc".to_string()),
                ..TreeConfig::default()
            },
            ..AppConfig::default()
        }
    }
}

/// Absolute, platform-formatted form of a user-supplied path.
fn absolute_path(path: &Path) -> error::Result<String> {
    let abs = path.canonicalize().map_err(|_| {
        error::AppError::InvalidPath(format!("{} does not exist", path.display()))
    })?;
    let s = abs.to_string_lossy();
    // Windows canonical paths carry a verbatim prefix that volume names lack.
    Ok(s.strip_prefix(r"\\?\").unwrap_or(&s).to_string())
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();

    let log_dir = cli.log_dir.clone().unwrap_or_else(logging::default_log_dir);
    let _log_guard = logging::init(&log_dir, &cli.log_level)?;

    let cli_path = cli.path.as_deref().map(absolute_path).transpose()?;
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides(cli_path)));
    tracing::info!(
        order = %config.order().label(),
        separator = %config.separator().as_char(),
        theme = config.theme_scheme(),
        "configuration loaded"
    );

    // A configured path that no longer exists falls back to the volume list.
    let startup_path = config
        .startup_path()
        .and_then(|p| match absolute_path(Path::new(p)) {
            Ok(abs) => Some(abs),
            Err(e) => {
                tracing::warn!("ignoring startup path: {e}");
                None
            }
        });

    install_panic_hook();

    let provider = LocalProvider::new(startup_path);
    let mut events = EventHandler::new(Duration::from_millis(100));
    let dispatcher = Dispatcher::new(Arc::new(provider), events.sender());
    let mut app = App::new(&config, dispatcher);
    let mut tui = Tui::new(config.mouse_enabled())?;

    app.start();

    loop {
        tui.draw(&mut app)?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
            background => app.handle_background(background),
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    tracing::info!("exiting");
    Ok(())
}
