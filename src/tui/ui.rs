//! UI Rendering
//!
//! Layout and rendering for the chat interface.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::tui::app::{App, DisplayRole, PipelineStage, View};
use crate::tui::theme::{Icons, Theme};

/// Render the main UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Messages
            Constraint::Length(4), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    render_messages(frame, chunks[1], app);
    render_input(frame, chunks[2], app);
    render_status_bar(frame, chunks[3], app);

    match app.view {
        View::KeyEntry => render_key_entry(frame, app),
        View::Help => render_help(frame),
        View::Chat => {}
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let key_dot = if app.api_key_set() {
        Span::styled(Icons::READY, Theme::success())
    } else {
        Span::styled(Icons::MISSING, Theme::error())
    };

    let dataset = match &app.dataset_label {
        Some(name) => Span::styled(name.clone(), Theme::success()),
        None => Span::styled("no dataset", Theme::text_dim()),
    };

    let line = Line::from(vec![
        Span::styled(" Datachat ", Theme::title()),
        Span::raw("│ "),
        dataset,
        Span::raw("  │  API key "),
        key_dot,
        Span::raw(" "),
    ]);

    let header = Paragraph::new(line)
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL).border_style(Theme::border()));
    frame.render_widget(header, area);
}

fn render_messages(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = Vec::new();

    for message in &app.messages {
        let (label, style) = match message.role {
            DisplayRole::User => ("You", Theme::user_message()),
            DisplayRole::Assistant => ("Assistant", Theme::assistant_message()),
            DisplayRole::System => ("System", Theme::system_message()),
        };

        lines.push(Line::from(vec![
            Span::styled(label, style),
            Span::styled(
                format!("  {}", message.timestamp.format("%H:%M:%S")),
                Theme::text_dim(),
            ),
        ]));

        for line in message.content.lines() {
            lines.push(Line::from(Span::styled(line.to_string(), Theme::text())));
        }
        lines.push(Line::default());
    }

    let messages = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0))
        .block(
            Block::default()
                .title(" Conversation ")
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
    frame.render_widget(messages, area);
}

fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Input ")
        .borders(Borders::ALL)
        .border_style(Theme::border());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(&app.input, inner);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let stage = match &app.stage {
        PipelineStage::Idle => Span::styled("ready", Theme::text_dim()),
        PipelineStage::Parsing => Span::styled(
            format!("{} parsing upload...", Icons::BUSY),
            Theme::warning(),
        ),
        PipelineStage::Indexing => Span::styled(
            format!("{} indexing dataset...", Icons::BUSY),
            Theme::warning(),
        ),
        PipelineStage::Thinking => {
            Span::styled(format!("{} thinking...", Icons::BUSY), Theme::warning())
        }
        PipelineStage::Complete => Span::styled("done", Theme::success()),
        PipelineStage::Error(e) => {
            Span::styled(format!("{} {}", Icons::ERROR, e), Theme::error())
        }
    };

    let line = Line::from(vec![
        Span::styled(" [Enter]", Theme::shortcut_key()),
        Span::raw(" send  "),
        Span::styled("[Ctrl+K]", Theme::shortcut_key()),
        Span::raw(" api key  "),
        Span::styled("[F1]", Theme::shortcut_key()),
        Span::raw(" help  "),
        Span::styled("[Ctrl+Q]", Theme::shortcut_key()),
        Span::raw(" quit  │  "),
        stage,
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_key_entry(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 7, frame.area());
    frame.render_widget(Clear, area);

    let masked: String = "•".repeat(app.key_input.chars().count());
    let current = app
        .masked_key()
        .map(|k| format!("current: {}", k))
        .unwrap_or_else(|| "no key set".to_string());

    let lines = vec![
        Line::from(Span::styled(
            "Enter your completion API key",
            Theme::text(),
        )),
        Line::from(Span::styled(current, Theme::text_dim())),
        Line::default(),
        Line::from(vec![Span::raw("> "), Span::styled(masked, Theme::text())]),
    ];

    let dialog = Paragraph::new(lines).block(
        Block::default()
            .title(" API Key ")
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );
    frame.render_widget(dialog, area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(64, 14, frame.area());
    frame.render_widget(Clear, area);

    let entries = [
        ("/open <path>", "load an .xlsx or .json dataset"),
        ("/clear", "clear the chat history"),
        ("Enter", "send the current input"),
        ("Ctrl+K", "set the completion API key"),
        ("Up/Down, PgUp/PgDn", "scroll the conversation"),
        ("Esc", "close this window"),
        ("Ctrl+Q", "quit"),
    ];

    let mut lines = vec![Line::default()];
    for (key, description) in entries {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<20}", key), Theme::shortcut_key()),
            Span::styled(description, Theme::text()),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "  Questions are answered from the loaded dataset only.",
        Theme::text_dim(),
    )));

    let dialog = Paragraph::new(lines).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );
    frame.render_widget(dialog, area);
}

/// Centered rect of fixed size within `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
