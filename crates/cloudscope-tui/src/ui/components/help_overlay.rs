use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let area = frame.area();

        let help_text = Self::lines();

        // Center the help popup
        let popup_width = 56.min(area.width.saturating_sub(4));
        let popup_height = (help_text.len() as u16 + 2).min(area.height.saturating_sub(2));

        let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
        let y = area.y + (area.height.saturating_sub(popup_height)) / 2;
        let popup_area = Rect::new(x, y, popup_width, popup_height);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn lines() -> Vec<Line<'static>> {
        vec![
            Self::section("Navigation"),
            Self::key_line("j/↓ k/↑", "Next / previous line"),
            Self::key_line("Ctrl+d/u", "Page down / up"),
            Self::key_line("g G", "First / last line"),
            Self::key_line("Enter", "Show or hide line details"),
            Self::key_line("mouse", "Click, drag to select, wheel"),
            Line::from(""),
            Self::section("Groups"),
            Self::key_line("v", "Cycle grouping (none/stream/invocation)"),
            Self::key_line("Tab", "Fold the current group"),
            Self::key_line("z", "Fold / unfold all groups"),
            Self::key_line("w", "Keep whole groups on match"),
            Line::from(""),
            Self::section("Filter"),
            Self::key_line("/", "Find (regex or metadata.<key>:<value>)"),
            Self::key_line("*", "Find by current line"),
            Self::key_line("n", "Clear filter"),
            Self::key_line("i", "Toggle case sensitivity"),
            Self::key_line("1-8 0", "Toggle level / show all"),
            Self::key_line("E Q", "Errors only / quiet"),
            Line::from(""),
            Self::section("Actions"),
            Self::key_line("y Ctrl+c", "Copy selection"),
            Self::key_line("Y", "Copy group"),
            Self::key_line("Ctrl+a", "Select all"),
            Self::key_line("m", "Line menu"),
            Self::key_line("s", "Toggle stats bar"),
            Self::key_line("e", "Export view to file"),
            Self::key_line("Esc", "Close / clear selection"),
            Self::key_line("q", "Quit"),
        ]
    }

    fn section(title: &'static str) -> Line<'static> {
        Line::from(Span::styled(title, Style::default().fg(Color::Yellow)))
    }

    fn key_line(key: &'static str, desc: &'static str) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("  {:>9}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
