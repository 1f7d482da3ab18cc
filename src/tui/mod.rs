//! Terminal User Interface Module
//!
//! The interactive surface: a chat screen with a scrollable conversation,
//! an input box with slash commands for loading data and clearing the chat,
//! and an API key entry dialog. Built with Ratatui.

pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::{App, AppEvent, PipelineStage, View};
pub use event::{AppAction, EventHandler};

use std::path::PathBuf;
use std::sync::Arc;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use tracing::{error, info};

use crate::config::Config;
use crate::engine::ChatEngine;

/// Type alias for our terminal backend
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state
pub fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI application
pub async fn run(
    config: &Config,
    engine: Arc<ChatEngine>,
    preload: Option<PathBuf>,
) -> anyhow::Result<()> {
    info!("starting TUI mode");

    let mut terminal = init_terminal()?;

    let mut app = App::new(config, engine);
    if let Some(path) = preload {
        app.start_ingest(path);
    }

    let mut events = EventHandler::new(std::time::Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &mut events).await;

    if let Err(e) = restore_terminal(&mut terminal) {
        error!("failed to restore terminal: {}", e);
    }

    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
) -> anyhow::Result<()> {
    loop {
        let size = terminal.size()?;
        let content_height = app.content_height(size.width.saturating_sub(2));
        app.update_scroll_bounds(content_height, size.height.saturating_sub(9));

        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle async events from spawned pipeline tasks
        app.poll_events();

        // Handle user input
        if let Some(action) = events.try_next().await {
            match action {
                AppAction::Quit | AppAction::ForceQuit => break,
                _ => app.handle_action(action).await,
            }
        }

        if app.should_quit {
            break;
        }

        // Small yield to prevent busy loop
        tokio::task::yield_now().await;
    }

    info!("TUI exited normally");
    Ok(())
}
