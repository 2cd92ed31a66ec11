//! userdir-manager binary entry point.
//!
//! Parses CLI options, initializes logging, puts the terminal in raw mode,
//! runs the TUI event loop, and restores the terminal state on exit.
//!
use crate::error::Result;
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use url::Url;

mod api;
mod app;
mod error;
mod ui;

/// TUI to browse and edit user records in a remote directory service.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Base URL of the directory API.
    #[arg(
        long,
        env = "USERDIR_API_URL",
        default_value = "https://jsonplaceholder.typicode.com/"
    )]
    api_url: Url,

    /// File receiving diagnostic logs (the TUI owns the terminal).
    #[arg(long, env = "USERDIR_LOG_FILE", default_value = "userdir-manager.log")]
    log_file: PathBuf,
}

/// Send diagnostics to the log file, honoring `RUST_LOG`.
fn init_tracing(path: &PathBuf) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_file)?;
    let client = api::DirectoryClient::new(args.api_url)?;
    tracing::info!("directory service: {}", client.base_url());

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {}", e))?;

    let res = app::run(&mut terminal, client);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        eprintln!("application error: {err}");
    }
    Ok(())
}
