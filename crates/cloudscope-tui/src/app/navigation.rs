//! Keyboard movement, selection, clipboard and group operations.
//!
//! The cursor only ever rests on log rows. Ungrouped, movement is plain
//! arithmetic over the filtered logs; grouped, it walks the log rows of the
//! projection and skips headers.

use std::sync::Arc;

use cloudscope_types::{GroupSection, LogLevel};

use super::state::{AppState, row_layout};
use crate::ui::ScrollAlign;

impl AppState {
    /// Rows moved by page up/down
    pub fn page_size(&self) -> usize {
        self.settings
            .page_size
            .unwrap_or_else(|| usize::from(self.viewport.height / self.row_heights.plain.max(1)))
            .max(1)
    }

    /// Move the cursor by `delta` log rows, clamped to the ends
    pub fn move_cursor(&mut self, delta: isize) {
        if self.ui_state.grouping.is_grouped() {
            let indices = self.projection.log_indices();
            if indices.is_empty() {
                return;
            }
            let current = self
                .selection
                .selected_index
                .and_then(|i| indices.iter().position(|&x| x == i))
                .unwrap_or(0);
            let next = current.saturating_add_signed(delta).min(indices.len() - 1);
            self.set_cursor(indices[next]);
        } else {
            let count = self.projection.filtered().len();
            if count == 0 {
                return;
            }
            let current = self
                .selection
                .selected_index
                .and_then(|i| usize::try_from(i).ok())
                .unwrap_or(0);
            let next = current.saturating_add_signed(delta).min(count - 1);
            self.set_cursor(next as i64);
        }
    }

    pub fn move_to_top(&mut self) {
        if let Some(first) = self.projection.items().iter().find_map(|item| item.log_index()) {
            self.set_cursor(first);
        }
    }

    pub fn move_to_bottom(&mut self) {
        if let Some(last) = self
            .projection
            .items()
            .iter()
            .rev()
            .find_map(|item| item.log_index())
        {
            self.set_cursor(last);
        }
    }

    /// Put the cursor on a log row. Drops the multi-selection.
    pub fn set_cursor(&mut self, log_index: i64) {
        self.selection.selected_index = Some(log_index);
        self.selection.selected_set.clear();
        if let Some(position) = self.projection.position_of(log_index) {
            self.ui_state.last_cursor_position = position;
            self.scroll_to(position, ScrollAlign::Auto);
        }
    }

    pub fn scroll_to(&mut self, position: usize, align: ScrollAlign) {
        let layout = row_layout(&self.projection, &self.selection, self.row_heights);
        self.viewport.scroll_to_row(&layout, position, align);
    }

    /// Scroll the list without moving the cursor
    pub fn scroll_by(&mut self, delta: isize) {
        self.viewport.offset = self.viewport.offset.saturating_add_signed(delta);
        let layout = row_layout(&self.projection, &self.selection, self.row_heights);
        self.viewport.clamp(&layout);
    }

    /// Open or close the cursor row's detail panel
    pub fn toggle_expand(&mut self) {
        if let Some(index) = self.selection.selected_index {
            self.selection.toggle_expansion(index);
            if let Some(position) = self.projection.position_of(index) {
                self.scroll_to(position, ScrollAlign::Auto);
            }
        }
    }

    /// Section whose header precedes a display position
    pub fn group_at(&self, position: usize) -> Option<&Arc<GroupSection>> {
        let items = self.projection.items();
        items
            .get(..=position.min(items.len().checked_sub(1)?))?
            .iter()
            .rev()
            .find_map(|item| item.group())
    }

    /// Collapse or expand one section
    pub fn toggle_collapsed(&mut self, group_id: &str) {
        if !self.ui_state.collapsed.remove(group_id) {
            self.ui_state.collapsed.insert(group_id.to_string());
        }
        self.refresh();
        // keep the header on screen when the cursor's rows folded away
        if let Some(position) = self.projection.position_of_group(group_id)
            && self.cursor_position().is_none()
        {
            self.scroll_to(position, ScrollAlign::Auto);
        }
    }

    /// Collapse or expand the section holding the cursor
    pub fn toggle_cursor_group(&mut self) {
        if !self.ui_state.grouping.is_grouped() {
            return;
        }
        let Some(id) = self
            .cursor_position()
            .and_then(|p| self.group_at(p))
            .map(|g| g.id.clone())
        else {
            return;
        };
        self.toggle_collapsed(&id);
    }

    /// Collapse every section, or expand all when any is collapsed
    pub fn toggle_all_groups(&mut self) {
        if !self.ui_state.grouping.is_grouped() {
            return;
        }
        if self.ui_state.collapsed.is_empty() {
            let logs = self.store.all();
            let sections = self.memo.sections(&logs, self.ui_state.grouping);
            self.ui_state.collapsed = sections.iter().map(|s| s.id.clone()).collect();
        } else {
            self.ui_state.collapsed.clear();
        }
        self.refresh();
    }

    pub fn set_grouping(&mut self, mode: cloudscope_types::GroupingMode) {
        if self.ui_state.grouping == mode {
            return;
        }
        self.ui_state.grouping = mode;
        self.ui_state.collapsed.clear();
        self.selection.expanded_index = None;
        self.refresh();
        if let Some(position) = self.cursor_position() {
            self.scroll_to(position, ScrollAlign::Center);
        }
        self.set_status(format!("Grouping: {}", mode.label()));
    }

    pub fn select_all(&mut self) {
        self.selection.selected_set = self.projection.log_indices().into_iter().collect();
    }

    /// Text of the selected rows in display order, else of the cursor row
    pub fn selection_text(&self) -> Option<String> {
        if self.selection.has_multi_selection() {
            let mut rows: Vec<_> = self
                .selection
                .selected_set
                .iter()
                .filter_map(|&i| Some((self.projection.position_of(i)?, self.projection.resolve(i)?)))
                .collect();
            rows.sort_by_key(|(position, _)| *position);
            return Some(
                rows.iter()
                    .map(|(_, log)| log.message.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }
        self.cursor_event().map(|log| log.message.clone())
    }

    /// Text of the visible rows of the cursor's section. The cursor never
    /// rests inside a collapsed section, so there is nothing to copy then.
    pub fn group_text(&self) -> Option<String> {
        let position = self.cursor_position()?;
        let group = self.group_at(position)?;
        let header = self.projection.position_of_group(&group.id)?;
        let text = self.projection.items()[header + 1..]
            .iter()
            .take_while(|item| !item.is_header())
            .filter_map(|item| item.log())
            .map(|log| log.message.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Some(text)
    }

    pub fn copy_selection(&mut self) {
        let Some(text) = self.selection_text() else {
            return;
        };
        let lines = text.lines().count().max(1);
        self.copy_to_clipboard(&text, format!("Copied {lines} line(s)"));
    }

    pub fn copy_group(&mut self) {
        let Some(text) = self.group_text() else {
            self.set_status("No group under the cursor");
            return;
        };
        let lines = text.lines().count();
        self.copy_to_clipboard(&text, format!("Copied group ({lines} line(s))"));
    }

    fn copy_to_clipboard(&mut self, text: &str, done: String) {
        match self.clipboard.set_text(text) {
            Ok(()) => self.set_status(done),
            Err(e) => self.show_error(e.to_string()),
        }
    }

    /// Dismiss the topmost thing: error, help, context menu, find bar, then
    /// the expanded row and multi-selection together.
    pub fn escape(&mut self) {
        let ui = &mut self.ui_state;
        if ui.error_message.is_some() {
            ui.error_message = None;
        } else if ui.help_visible {
            ui.help_visible = false;
        } else if ui.context_menu.visible {
            ui.context_menu.close();
        } else if ui.find.open {
            ui.find.open = false;
            ui.find.error = None;
        } else if self.selection.expanded_index.is_some() || self.selection.has_multi_selection() {
            self.selection.clear();
            self.drag.cancel();
        }
    }

    pub fn toggle_level(&mut self, level: LogLevel) {
        let mut levels = self.ui_state.active_filter.disabled_levels().clone();
        if !levels.remove(&level) {
            levels.insert(level);
        }
        self.set_disabled_levels(levels);
    }

    pub fn set_disabled_levels(&mut self, levels: std::collections::HashSet<LogLevel>) {
        self.ui_state.active_filter = self.ui_state.active_filter.clone().with_disabled_levels(levels);
        self.refresh();
    }
}
