mod app;
mod board;
mod config;
mod grid;
mod help;
mod persist;
mod prompt;
mod snapshot;
mod status;
mod store;
mod theme;
mod week;
use crate::app::App;
use crate::board::Board;
use crate::config::{Command, Config, USAGE};
use crate::persist::{FileStore, FirebaseTransport, LocalBackend};
use crate::week::WeekCursor;
use anyhow::Context;
use lexopt::Parser;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing_subscriber::EnvFilter;

impl Command {
    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run(config) => run(config),
            Command::Help => {
                println!("{USAGE}");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env(), |key| std::env::var_os(key))?.run()
}

fn run(config: Config) -> anyhow::Result<()> {
    // Determine the local time before any threads are spawned
    let now = OffsetDateTime::now_local().context("failed to determine local time")?;
    let now = PrimitiveDateTime::new(now.date(), now.time());
    if let Some(path) = &config.log_file {
        init_logging(path)?;
    }
    let store = FileStore::new(&config.data_file);
    tracing::info!(path = %store.path().display(), "Using local data file");
    let remote = config.remote_url.as_deref().map(FirebaseTransport::new);
    if let Some(transport) = &remote {
        tracing::info!(url = transport.url(), "Using remote database");
    }
    let board = Board::open(persist::open(remote, LocalBackend::new(store)));
    let mut app = App::new(board, now);
    if let Some(cursor) = config.start_week(WeekCursor::today(now)) {
        app = app.start_week(cursor);
    }
    with_terminal(|mut terminal| {
        terminal.hide_cursor().context("failed to hide cursor")?;
        app.run(terminal)?;
        Ok(())
    })
}

// The terminal belongs to the UI, so logs only go to a file
fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}
