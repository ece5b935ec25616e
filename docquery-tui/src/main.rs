//! docquery - Document Q&A terminal client
//!
//! Terminal UI for asking questions about a document library, browsing the
//! library, and watching backend usage.

mod app;
mod ui;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use docquery_core::{ApiClient, Backend, Config, SearchHistory};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;

#[derive(Parser)]
#[command(name = "docquery")]
#[command(about = "Ask questions about your document library")]
#[command(version)]
struct Args {
    /// Backend base URL (overrides config and DOCQUERY_API_URL)
    #[arg(long)]
    api_url: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(url) = args.api_url {
        config = config.with_api_url(url).context("invalid --api-url")?;
    }

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        docquery_core::logging::init(&config).context("failed to initialize logging")?;

    tracing::info!("docquery TUI starting up");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let backend: Arc<dyn Backend> =
        Arc::new(ApiClient::new(&config.api).context("failed to create API client")?);

    let history_path = Config::history_path();
    tracing::info!(path = %history_path.display(), "Loading search history");
    let history = SearchHistory::load(&history_path, config.history.cap);

    let mut app = App::new(backend, runtime.handle().clone(), history, &config);

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    // Stops the analytics poller before the runtime goes away
    drop(app);
    runtime.shutdown_timeout(std::time::Duration::from_secs(1));

    tracing::info!("docquery TUI shutting down");

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Pick up finished requests
        app.tick();

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
