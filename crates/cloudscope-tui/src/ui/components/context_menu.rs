use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
};

use crate::app::Action;

/// An entry of the row context menu
#[derive(Clone, Debug, PartialEq)]
pub struct MenuItem {
    pub label: String,
    pub key_hint: &'static str,
    pub action: Action,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, key_hint: &'static str, action: Action) -> Self {
        Self {
            label: label.into(),
            key_hint,
            action,
        }
    }
}

/// Context menu state
#[derive(Default)]
pub struct ContextMenuState {
    pub visible: bool,
    pub items: Vec<MenuItem>,
    pub list_state: ListState,
    /// Screen cell the menu was opened at; None centers it
    pub anchor: Option<(u16, u16)>,
    /// Where the menu was last drawn, for mouse hit-testing
    pub area: Option<Rect>,
}

impl ContextMenuState {
    pub fn open(&mut self, items: Vec<MenuItem>, anchor: Option<(u16, u16)>) {
        self.visible = !items.is_empty();
        self.items = items;
        self.anchor = anchor;
        self.area = None;
        self.list_state.select(self.visible.then_some(0));
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.items.clear();
        self.area = None;
        self.list_state.select(None);
    }

    pub fn move_up(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn move_down(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn selected_action(&self) -> Option<Action> {
        let i = self.list_state.selected()?;
        self.items.get(i).map(|item| item.action.clone())
    }

    /// Menu entry under a screen cell
    pub fn item_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.area?;
        let inside_x = column > area.x && column < area.right().saturating_sub(1);
        let inside_y = row > area.y && row < area.bottom().saturating_sub(1);
        if !(inside_x && inside_y) {
            return None;
        }
        let index = usize::from(row - area.y - 1);
        (index < self.items.len()).then_some(index)
    }
}

/// Row context menu widget
pub struct ContextMenu;

impl ContextMenu {
    pub fn render(frame: &mut Frame, state: &mut ContextMenuState) {
        if !state.visible {
            return;
        }
        let screen = frame.area();

        let label_width = state
            .items
            .iter()
            .map(|item| item.label.chars().count() + item.key_hint.len() + 4)
            .max()
            .unwrap_or(0);
        let width = (label_width as u16 + 4).min(screen.width);
        let height = (state.items.len() as u16 + 2).min(screen.height);

        let area = match state.anchor {
            Some((column, row)) => {
                let x = column.min(screen.right().saturating_sub(width));
                let y = row.min(screen.bottom().saturating_sub(height));
                Rect::new(x, y, width, height)
            }
            None => centered_rect(width, height, screen),
        };
        state.area = Some(area);

        frame.render_widget(Clear, area);

        let items: Vec<ListItem> = state
            .items
            .iter()
            .map(|item| {
                let padding = label_width.saturating_sub(item.label.chars().count() + item.key_hint.len() + 2);
                ListItem::new(Line::from(vec![
                    Span::raw(item.label.clone()),
                    Span::raw(" ".repeat(padding)),
                    Span::styled(item.key_hint, Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Yellow)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );

        frame.render_stateful_widget(list, area, &mut state.list_state);
    }
}

/// Helper to create a centered rect
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
