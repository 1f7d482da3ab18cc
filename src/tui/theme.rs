//! Theme and Styling

use ratatui::style::{Color, Modifier, Style};

/// Application theme
pub struct Theme;

impl Theme {
    /// Primary accent color
    pub const ACCENT: Color = Color::Rgb(125, 207, 255);
    /// Success color
    pub const SUCCESS: Color = Color::Rgb(80, 200, 120);
    /// Warning color
    pub const WARNING: Color = Color::Rgb(240, 180, 60);
    /// Error color
    pub const ERROR: Color = Color::Rgb(230, 80, 80);

    /// Primary text color
    pub const TEXT_PRIMARY: Color = Color::Rgb(220, 220, 220);
    /// Dimmed text
    pub const TEXT_DIM: Color = Color::Rgb(110, 110, 110);

    /// Default border color
    pub const BORDER: Color = Color::Rgb(60, 60, 60);

    // Role colors
    pub const USER: Color = Color::Rgb(80, 200, 120);
    pub const ASSISTANT: Color = Color::Rgb(125, 207, 255);
    pub const SYSTEM: Color = Color::Rgb(240, 180, 60);

    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::TEXT_DIM)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    pub fn user_message() -> Style {
        Style::default().fg(Self::USER).add_modifier(Modifier::BOLD)
    }

    pub fn assistant_message() -> Style {
        Style::default()
            .fg(Self::ASSISTANT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn system_message() -> Style {
        Style::default()
            .fg(Self::SYSTEM)
            .add_modifier(Modifier::BOLD)
    }

    pub fn shortcut_key() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }
}

/// Status icons
pub struct Icons;

impl Icons {
    pub const READY: &'static str = "●";
    pub const MISSING: &'static str = "○";
    pub const ERROR: &'static str = "✗";
    pub const BUSY: &'static str = "◌";
}
