//! Event Handling
//!
//! Maps keyboard and timer events to application actions.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;

/// Actions the user can trigger.
#[derive(Debug, Clone)]
pub enum AppAction {
    /// Quit the application
    Quit,
    /// Force quit without confirmation
    ForceQuit,
    /// Submit current input (Enter key)
    Submit,
    /// Toggle the API key entry view
    ToggleKeyEntry,
    /// Toggle the help view
    ToggleHelp,
    /// Escape - close modals, cancel
    Escape,
    /// Scroll up one line
    ScrollUp,
    /// Scroll down one line
    ScrollDown,
    /// Scroll up one page
    ScrollPageUp,
    /// Scroll down one page
    ScrollPageDown,
    /// Regular input character
    Input(KeyEvent),
    /// Timer tick for animations
    Tick,
}

/// Event handler for the TUI
pub struct EventHandler {
    rx: mpsc::Receiver<AppAction>,
    _tx: mpsc::Sender<AppAction>,
}

impl EventHandler {
    /// Create a new event handler with the given tick rate
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel(100);
        let tx_clone = tx.clone();

        tokio::spawn(async move {
            let mut reader = crossterm::event::EventStream::new();
            let mut tick_interval = tokio::time::interval(tick_rate);

            loop {
                let tick = tick_interval.tick();
                let crossterm_event = reader.next().fuse();

                tokio::select! {
                    _ = tick => {
                        if tx_clone.send(AppAction::Tick).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(evt)) = crossterm_event => {
                        if let Some(action) = Self::map_event(evt) {
                            if tx_clone.send(action).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Try to get the next action without blocking
    pub async fn try_next(&mut self) -> Option<AppAction> {
        self.rx.try_recv().ok()
    }

    fn map_event(event: Event) -> Option<AppAction> {
        match event {
            Event::Key(key) => Self::map_key_event(key),
            _ => None,
        }
    }

    fn map_key_event(key: KeyEvent) -> Option<AppAction> {
        match (key.modifiers, key.code) {
            // Quit shortcuts
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(AppAction::ForceQuit),
            (KeyModifiers::CONTROL, KeyCode::Char('q')) => Some(AppAction::Quit),

            // View toggles
            (KeyModifiers::CONTROL, KeyCode::Char('k')) => Some(AppAction::ToggleKeyEntry),
            (KeyModifiers::CONTROL, KeyCode::Char('h')) => Some(AppAction::ToggleHelp),

            (KeyModifiers::NONE, code) | (KeyModifiers::SHIFT, code) => match code {
                KeyCode::Esc => Some(AppAction::Escape),
                KeyCode::Enter => Some(AppAction::Submit),
                KeyCode::F(1) => Some(AppAction::ToggleHelp),

                // Scrolling
                KeyCode::Up => Some(AppAction::ScrollUp),
                KeyCode::Down => Some(AppAction::ScrollDown),
                KeyCode::PageUp => Some(AppAction::ScrollPageUp),
                KeyCode::PageDown => Some(AppAction::ScrollPageDown),

                // All other characters are input
                _ => Some(AppAction::Input(key)),
            },

            // Pass through other key combinations as input
            _ => Some(AppAction::Input(key)),
        }
    }
}
