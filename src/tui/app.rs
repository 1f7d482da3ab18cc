//! Application State
//!
//! Holds the TUI state and drives the upload and question flows against the
//! chat engine. Long-running work (parsing, indexing, completion calls) runs
//! on spawned tasks reporting back over an mpsc channel; one interaction is
//! in flight at a time.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::warn;
use tui_textarea::TextArea;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::{ChatEngine, IngestReport};
use crate::tui::event::AppAction;
use crate::types::FileFormat;

const INPUT_PLACEHOLDER: &str = "Ask about your data... (/open <path> to load a file)";

/// Interaction pipeline stage
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PipelineStage {
    /// Idle, waiting for input
    #[default]
    Idle,
    /// Reading and parsing an upload
    Parsing,
    /// Building the vector index
    Indexing,
    /// Waiting on the completion endpoint
    Thinking,
    /// Last interaction finished
    Complete,
    /// Error occurred
    Error(String),
}

impl PipelineStage {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineStage::Parsing | PipelineStage::Indexing | PipelineStage::Thinking
        )
    }
}

/// A rendered chat line
#[derive(Debug, Clone)]
pub struct DisplayMessage {
    pub role: DisplayRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayRole {
    User,
    Assistant,
    System,
}

impl DisplayMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: DisplayRole::System,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Current view/screen
#[derive(Debug, Clone, PartialEq, Default)]
pub enum View {
    #[default]
    Chat,
    KeyEntry,
    Help,
}

/// Events from spawned pipeline tasks
#[derive(Debug)]
pub enum AppEvent {
    /// Pipeline stage changed
    StageChanged(PipelineStage),
    /// Upload finished
    DatasetLoaded {
        filename: String,
        report: IngestReport,
    },
    /// Upload failed
    DatasetFailed(String),
    /// Completion answer arrived (already recorded in the session)
    Answer(String),
    /// Question was rejected before reaching the endpoint
    AskFailed(String),
}

/// Main application state
pub struct App {
    engine: Arc<ChatEngine>,
    session_id: Uuid,

    // Credential for the completion endpoint, held in memory only
    api_key: String,

    // UI state
    pub view: View,
    pub should_quit: bool,
    pub messages: Vec<DisplayMessage>,
    pub input: TextArea<'static>,
    pub scroll_offset: u16,
    pub max_scroll: u16,
    pub stage: PipelineStage,
    pub dataset_label: Option<String>,
    pub key_input: String,

    // Async communication
    event_rx: Option<mpsc::Receiver<AppEvent>>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
}

impl App {
    pub fn new(config: &Config, engine: Arc<ChatEngine>) -> Self {
        let mut input = TextArea::default();
        input.set_cursor_line_style(ratatui::style::Style::default());
        input.set_placeholder_text(INPUT_PLACEHOLDER);

        let (tx, rx) = mpsc::channel(100);

        let messages = vec![DisplayMessage::system(
            "Welcome to Datachat!\n\n\
             Load a dataset with /open <path> (.xlsx or .json), then ask\n\
             questions about it. Press Ctrl+K to set your API key, /clear\n\
             to clear the chat, F1 for help.",
        )];

        Self {
            engine,
            session_id: Uuid::new_v4(),
            api_key: config.llm.api_key.clone(),
            view: View::Chat,
            should_quit: false,
            messages,
            input,
            scroll_offset: 0,
            max_scroll: 0,
            stage: PipelineStage::Idle,
            dataset_label: None,
            key_input: String::new(),
            event_rx: Some(rx),
            event_tx: Some(tx),
        }
    }

    pub fn api_key_set(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Last four characters of the key, for the key entry view.
    pub fn masked_key(&self) -> Option<String> {
        if self.api_key.is_empty() {
            None
        } else {
            let tail: String = self
                .api_key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            Some(format!("••••{}", tail))
        }
    }

    /// Poll for async events from spawned tasks
    pub fn poll_events(&mut self) {
        let events: Vec<AppEvent> = {
            if let Some(ref mut rx) = self.event_rx {
                let mut collected = Vec::new();
                while let Ok(event) = rx.try_recv() {
                    collected.push(event);
                }
                collected
            } else {
                Vec::new()
            }
        };

        for event in events {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::StageChanged(stage) => {
                self.stage = stage;
            }
            AppEvent::DatasetLoaded { filename, report } => {
                self.stage = PipelineStage::Complete;
                self.dataset_label = Some(filename.clone());
                let cache_note = if report.reused_cached_index {
                    "\n(existing index reused)"
                } else {
                    ""
                };
                self.messages.push(DisplayMessage::system(format!(
                    "Ready to chat! Loaded {} ({} chunks indexed){}\n\n{}",
                    filename, report.chunk_count, cache_note, report.preview
                )));
                self.scroll_to_bottom();
            }
            AppEvent::DatasetFailed(error) => {
                self.stage = PipelineStage::Error(error.clone());
                self.messages.push(DisplayMessage::system(error));
                self.scroll_to_bottom();
            }
            AppEvent::Answer(reply) => {
                self.stage = PipelineStage::Complete;
                self.messages.push(DisplayMessage {
                    role: DisplayRole::Assistant,
                    content: reply,
                    timestamp: Utc::now(),
                });
                self.scroll_to_bottom();
            }
            AppEvent::AskFailed(error) => {
                self.stage = PipelineStage::Error(error.clone());
                self.messages.push(DisplayMessage::system(error));
                self.scroll_to_bottom();
            }
        }
    }

    /// Handle a user action
    pub async fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::Quit | AppAction::ForceQuit => {
                self.should_quit = true;
            }
            AppAction::Submit => match self.view {
                View::KeyEntry => self.save_api_key(),
                View::Chat => self.submit_message(),
                View::Help => {}
            },
            AppAction::ToggleKeyEntry => {
                self.view = if self.view == View::KeyEntry {
                    View::Chat
                } else {
                    View::KeyEntry
                };
                self.key_input.clear();
            }
            AppAction::ToggleHelp => {
                self.view = if self.view == View::Help {
                    View::Chat
                } else {
                    View::Help
                };
            }
            AppAction::Escape => {
                if self.view != View::Chat {
                    self.view = View::Chat;
                    self.key_input.clear();
                }
            }
            AppAction::ScrollUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            AppAction::ScrollDown => {
                if self.scroll_offset < self.max_scroll {
                    self.scroll_offset += 1;
                }
            }
            AppAction::ScrollPageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            AppAction::ScrollPageDown => {
                self.scroll_offset = (self.scroll_offset + 10).min(self.max_scroll);
            }
            AppAction::Input(key_event) => {
                self.handle_input(key_event);
            }
            AppAction::Tick => {}
        }
    }

    fn handle_input(&mut self, key: crossterm::event::KeyEvent) {
        use crossterm::event::KeyCode;

        match self.view {
            View::KeyEntry => match key.code {
                KeyCode::Char(c) => self.key_input.push(c),
                KeyCode::Backspace => {
                    self.key_input.pop();
                }
                _ => {}
            },
            View::Chat => {
                self.input.input(key);
            }
            View::Help => {}
        }
    }

    fn save_api_key(&mut self) {
        let key = std::mem::take(&mut self.key_input);
        let key = key.trim().to_string();
        if key.is_empty() {
            return;
        }
        self.api_key = key;
        self.view = View::Chat;
        self.messages
            .push(DisplayMessage::system("API key set for this session."));
    }

    /// Submit the current chat input: a slash command or a question.
    fn submit_message(&mut self) {
        let content: String = self.input.lines().join("\n");
        let content = content.trim().to_string();
        if content.is_empty() {
            return;
        }

        if self.stage.is_busy() {
            self.messages.push(DisplayMessage::system(
                "Still working on the previous request...",
            ));
            return;
        }

        self.input = TextArea::default();
        self.input.set_placeholder_text(INPUT_PLACEHOLDER);

        if let Some(path) = content.strip_prefix("/open ") {
            self.start_ingest(PathBuf::from(path.trim()));
            return;
        }

        match content.as_str() {
            "/open" => self
                .messages
                .push(DisplayMessage::system("Usage: /open <path to .xlsx or .json>")),
            "/clear" => self.start_clear_chat(),
            "/help" => self.view = View::Help,
            _ => self.start_ask(content),
        }
    }

    /// Load, parse, and index a file on a background task.
    pub fn start_ingest(&mut self, path: PathBuf) {
        let Some(format) = FileFormat::from_path(&path) else {
            self.messages.push(DisplayMessage::system(format!(
                "Unsupported file type: {} (expected .xlsx or .json)",
                path.display()
            )));
            return;
        };

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        self.stage = PipelineStage::Parsing;
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let engine = self.engine.clone();
        let session_id = self.session_id;

        tokio::spawn(async move {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tx.send(AppEvent::DatasetFailed(format!(
                        "Could not read {}: {}",
                        path.display(),
                        e
                    )))
                    .await
                    .ok();
                    return;
                }
            };

            tx.send(AppEvent::StageChanged(PipelineStage::Indexing))
                .await
                .ok();

            match engine.ingest_file(session_id, &filename, &bytes, format).await {
                Ok(report) => {
                    tx.send(AppEvent::DatasetLoaded { filename, report }).await.ok();
                }
                Err(e) => {
                    tx.send(AppEvent::DatasetFailed(e.to_string())).await.ok();
                }
            }
        });
    }

    /// Send a question to the engine on a background task.
    fn start_ask(&mut self, question: String) {
        if !self.api_key_set() {
            self.messages.push(DisplayMessage::system(
                "API Key field is empty. Press Ctrl+K to enter your API key.",
            ));
            return;
        }

        self.messages.push(DisplayMessage {
            role: DisplayRole::User,
            content: question.clone(),
            timestamp: Utc::now(),
        });
        self.stage = PipelineStage::Thinking;
        self.scroll_to_bottom();

        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let engine = self.engine.clone();
        let session_id = self.session_id;
        let api_key = self.api_key.clone();

        tokio::spawn(async move {
            match engine.ask(session_id, &question, &api_key).await {
                Ok(reply) => {
                    tx.send(AppEvent::Answer(reply)).await.ok();
                }
                Err(e) => {
                    tx.send(AppEvent::AskFailed(e.to_string())).await.ok();
                }
            }
        });
    }

    fn start_clear_chat(&mut self) {
        self.messages.clear();
        self.messages.push(DisplayMessage::system("Chat cleared."));
        self.scroll_offset = 0;

        let engine = self.engine.clone();
        let session_id = self.session_id;
        tokio::spawn(async move {
            engine.clear_chat(session_id).await;
        });
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll;
    }

    /// Recompute scroll bounds from an estimated content height.
    pub fn update_scroll_bounds(&mut self, content_height: u16, viewport_height: u16) {
        self.max_scroll = content_height.saturating_sub(viewport_height);
        if self.scroll_offset > self.max_scroll {
            self.scroll_offset = self.max_scroll;
        }
    }

    /// Estimated rendered height of the message history.
    pub fn content_height(&self, width: u16) -> u16 {
        let width = width.max(1) as usize;
        let mut lines = 0usize;
        for message in &self.messages {
            lines += 1; // role header
            for line in message.content.lines() {
                lines += (line.chars().count() / width) + 1;
            }
            lines += 1; // spacing
        }
        lines.min(u16::MAX as usize) as u16
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if self.stage.is_busy() {
            warn!("exiting with an interaction still in flight");
        }
    }
}
