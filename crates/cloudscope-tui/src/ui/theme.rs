use ratatui::style::{Color, Modifier, Style};

use cloudscope_types::LogLevel;

/// Color theme for the application
pub struct Theme;

impl Theme {
    // Base colors
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    // Border styles
    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    // Text styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Message text of a log row; errors stand out, lifecycle lines recede
    pub fn level_text(level: LogLevel) -> Style {
        match level {
            LogLevel::Error | LogLevel::Fatal => Style::default().fg(Color::Red),
            LogLevel::Warn => Style::default().fg(Color::Yellow),
            LogLevel::System | LogLevel::Trace => Self::text_dim(),
            _ => Style::default(),
        }
    }

    // Rows
    pub fn cursor_row() -> Style {
        Style::default().bg(Color::Rgb(40, 40, 60))
    }

    pub fn selected_row() -> Style {
        Style::default().bg(Color::Rgb(30, 50, 70))
    }

    /// Filtered-out line shown because its group matched
    pub fn synthetic_row() -> Style {
        Style::default().add_modifier(Modifier::DIM)
    }

    pub fn group_header() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .bg(Color::Rgb(25, 25, 35))
            .add_modifier(Modifier::BOLD)
    }

    pub fn group_header_cold() -> Style {
        Style::default()
            .fg(Color::LightBlue)
            .bg(Color::Rgb(25, 25, 35))
            .add_modifier(Modifier::BOLD)
    }

    pub fn group_in_progress() -> Style {
        Style::default().fg(Self::WARNING)
    }

    pub fn detail_panel() -> Style {
        Style::default().bg(Color::Rgb(20, 20, 28))
    }

    pub fn match_highlight() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG_DIM).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    // Error
    pub fn error() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }
}
