use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use super::Action;
use super::selection::DragOutcome;
use super::state::{AppState, row_layout};
use crate::ui::ViewportRow;

/// Rows scrolled per wheel notch
const WHEEL_STEP: isize = 3;

impl AppState {
    /// Logical row under a screen cell of the log list. A detail panel
    /// counts as its log row.
    pub fn logical_row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.ui_state.list_area;
        if !area.contains(Position::new(column, row)) {
            return None;
        }
        let layout = row_layout(&self.projection, &self.selection, self.row_heights);
        match self.viewport.row_at(&layout, row - area.y)? {
            ViewportRow::Logical(l) | ViewportRow::Detail(l) => Some(l),
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);

        if self.ui_state.context_menu.visible {
            if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                match self.ui_state.context_menu.item_at(column, row) {
                    Some(index) => {
                        self.ui_state.context_menu.list_state.select(Some(index));
                        self.update(Action::MenuSelect);
                    }
                    None => self.ui_state.context_menu.close(),
                }
                self.render_dirty = true;
            }
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(logical) = self.logical_row_at(column, row) {
                    self.drag.press(logical, column, row);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let logical = self.logical_row_at(column, row);
                if let Some(rows) = self.drag.drag(logical, column, row) {
                    let items = self.projection.items();
                    self.selection.selected_set = rows
                        .filter_map(|p| items.get(p).and_then(|item| item.log_index()))
                        .collect();
                    self.render_dirty = true;
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                match self.drag.release() {
                    DragOutcome::Click { row } => self.click_row(row),
                    DragOutcome::Selected { .. } => {}
                    DragOutcome::Dismiss => self.selection.clear(),
                }
                self.render_dirty = true;
            }
            MouseEventKind::Down(MouseButton::Right) => {
                if let Some(logical) = self.logical_row_at(column, row)
                    && let Some(index) = self.projection.get(logical).and_then(|item| item.log_index())
                {
                    if !self.selection.selected_set.contains(&index) {
                        self.set_cursor(index);
                    } else {
                        self.selection.selected_index = Some(index);
                    }
                    self.open_context_menu(Some((column, row)));
                    self.render_dirty = true;
                }
            }
            MouseEventKind::ScrollDown => {
                self.scroll_by(WHEEL_STEP);
                self.render_dirty = true;
            }
            MouseEventKind::ScrollUp => {
                self.scroll_by(-WHEEL_STEP);
                self.render_dirty = true;
            }
            _ => {}
        }
    }

    /// Click without drag: a header folds its section, a log row takes the
    /// cursor and toggles its detail panel.
    pub fn click_row(&mut self, logical: usize) {
        let Some(item) = self.projection.get(logical) else {
            return;
        };
        if let Some(id) = item.group().map(|g| g.id.clone()) {
            self.toggle_collapsed(&id);
            return;
        }
        if let Some(index) = item.log_index() {
            self.set_cursor(index);
            self.toggle_expand();
        }
    }

    /// Where the log list is drawn, for hit-testing
    pub fn set_list_area(&mut self, area: Rect) {
        self.ui_state.list_area = area;
        self.viewport.height = area.height;
        let layout = row_layout(&self.projection, &self.selection, self.row_heights);
        self.viewport.clamp(&layout);
    }
}

#[cfg(test)]
mod tests {
    use super::super::state::tests::invocation_state;
    use super::*;
    use crossterm::event::KeyModifiers;
    use cloudscope_types::GroupingMode;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn state() -> AppState {
        let mut state = invocation_state();
        state.set_list_area(Rect::new(0, 2, 80, 20));
        state
    }

    #[test]
    fn test_click_toggles_expansion() {
        let mut state = state();
        state.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 4));
        state.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 5, 4));
        assert_eq!(state.selection.selected_index, Some(2));
        assert_eq!(state.selection.expanded_index, Some(2));

        state.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 4));
        state.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 5, 4));
        assert_eq!(state.selection.expanded_index, None);
    }

    #[test]
    fn test_drag_selects_range() {
        let mut state = state();
        state.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 3));
        state.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 5, 4));
        state.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 5, 5));
        state.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 5, 5));

        let mut selected: Vec<i64> = state.selection.selected_set.iter().copied().collect();
        selected.sort();
        assert_eq!(selected, vec![1, 2, 3]);
        assert_eq!(state.selection.expanded_index, None);
    }

    #[test]
    fn test_release_without_press_dismisses() {
        let mut state = state();
        state.selection.expanded_index = Some(0);
        state.selection.selected_set.insert(1);
        state.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 5, 4));
        assert_eq!(state.selection.expanded_index, None);
        assert!(!state.selection.has_multi_selection());
    }

    #[test]
    fn test_detail_row_maps_to_its_log() {
        let mut state = state();
        state.selection.expanded_index = Some(0);
        // line 0 is row 0, lines 1..=8 are its detail panel
        assert_eq!(state.logical_row_at(5, 2), Some(0));
        assert_eq!(state.logical_row_at(5, 6), Some(0));
        assert_eq!(state.logical_row_at(5, 11), Some(1));
        assert_eq!(state.logical_row_at(5, 1), None);
    }

    #[test]
    fn test_click_header_collapses_section() {
        let mut state = state();
        state.set_grouping(GroupingMode::Invocation);
        state.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 2));
        state.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 5, 2));
        assert!(state.ui_state.collapsed.contains("invocation:r1"));
    }

    #[test]
    fn test_right_click_opens_menu() {
        let mut state = state();
        state.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Right), 5, 3));
        assert!(state.ui_state.context_menu.visible);
        assert_eq!(state.selection.selected_index, Some(1));
    }
}
