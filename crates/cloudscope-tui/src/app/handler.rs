use cloudscope_logs::{CompiledFilter, FilterPresets, QuickFilterField};

use super::Action;
use super::state::AppState;
use crate::ui::components::MenuItem;

impl AppState {
    /// Apply an action to the state
    pub fn update(&mut self, action: Action) {
        if !matches!(action, Action::Render) {
            self.ui_state.status_message = None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::ToggleHelp => {
                self.ui_state.help_visible = !self.ui_state.help_visible;
            }
            Action::Escape => self.escape(),

            Action::MoveUp => self.move_cursor(-1),
            Action::MoveDown => self.move_cursor(1),
            Action::PageUp => {
                let page = self.page_size() as isize;
                self.move_cursor(-page);
            }
            Action::PageDown => {
                let page = self.page_size() as isize;
                self.move_cursor(page);
            }
            Action::MoveToTop => self.move_to_top(),
            Action::MoveToBottom => self.move_to_bottom(),

            Action::ToggleExpand => self.toggle_expand(),
            Action::ToggleGroup => self.toggle_cursor_group(),
            Action::ToggleAllGroups => self.toggle_all_groups(),
            Action::CycleGrouping => {
                let next = self.ui_state.grouping.next();
                self.set_grouping(next);
            }
            Action::SetGrouping(mode) => self.set_grouping(mode),

            Action::Copy => self.copy_selection(),
            Action::CopyGroup => self.copy_group(),
            Action::SelectAll => self.select_all(),

            Action::OpenFind => {
                let find = &mut self.ui_state.find;
                find.open = true;
                find.input = self.ui_state.active_filter.pattern().to_string();
                find.error = None;
            }
            Action::FindInput(c) => {
                self.ui_state.find.input.push(c);
            }
            Action::FindBackspace => {
                self.ui_state.find.input.pop();
            }
            Action::FindClear => {
                self.ui_state.find.input.clear();
            }
            Action::ApplyFind => {
                let input = self.ui_state.find.input.clone();
                match self.install_filter(&input) {
                    Ok(()) => {
                        self.ui_state.find.open = false;
                        self.ui_state.find.error = None;
                        self.refresh();
                    }
                    // keep the bar open to fix the pattern
                    Err(e) => self.ui_state.find.error = Some(e.to_string()),
                }
            }
            Action::ClearFilter => {
                self.clear_filter();
                self.ui_state.find.input.clear();
                self.refresh();
            }
            Action::ToggleCaseSensitive => {
                self.ui_state.filter_case_insensitive = !self.ui_state.filter_case_insensitive;
                let pattern = self.ui_state.active_filter.pattern().to_string();
                if self.ui_state.active_filter.has_pattern() {
                    if let Err(e) = self.install_filter(&pattern) {
                        self.show_error(e.to_string());
                    }
                    self.refresh();
                }
                let mode = if self.ui_state.filter_case_insensitive {
                    "insensitive"
                } else {
                    "sensitive"
                };
                self.set_status(format!("Case {mode} search"));
            }
            Action::ToggleGroupFilter => {
                self.ui_state.group_filter = !self.ui_state.group_filter;
                self.refresh();
                let state = if self.ui_state.group_filter { "on" } else { "off" };
                self.set_status(format!("Show whole matching groups: {state}"));
            }
            Action::FindBySelection => {
                if let Some(message) = self.cursor_event().map(|e| e.message.clone()) {
                    let levels = self.ui_state.active_filter.disabled_levels().clone();
                    self.ui_state.active_filter = CompiledFilter::literal(&message).with_disabled_levels(levels);
                    self.ui_state.find.input = message;
                    self.refresh();
                }
            }
            Action::QuickFilter(field) => self.quick_filter(field),

            Action::ToggleLevel(level) => self.toggle_level(level),
            Action::ErrorsOnly => self.set_disabled_levels(FilterPresets::errors_only()),
            Action::QuietLevels => self.set_disabled_levels(FilterPresets::quiet()),
            Action::ShowAllLevels => self.set_disabled_levels(Default::default()),

            Action::OpenContextMenu => self.open_context_menu(None),
            Action::MenuUp => self.ui_state.context_menu.move_up(),
            Action::MenuDown => self.ui_state.context_menu.move_down(),
            Action::MenuSelect => {
                let selected = self.ui_state.context_menu.selected_action();
                self.ui_state.context_menu.close();
                if let Some(action) = selected {
                    self.update(action);
                }
            }

            Action::ToggleStats => {
                self.ui_state.stats_visible = !self.ui_state.stats_visible;
            }
            // Writing files is left to the caller
            Action::ExportLogs => {}

            Action::ShowError(msg) => self.show_error(msg),
            Action::DismissError => self.dismiss_error(),
            Action::Render => {}
        }

        self.render_dirty = true;
    }

    fn quick_filter(&mut self, field: QuickFilterField) {
        let Some(value) = self.cursor_event().and_then(|e| field.value_for(e)) else {
            self.set_status(format!("No {} on this line", field.key()));
            return;
        };
        let text = field.filter_text(&value);
        match self.install_filter(&text) {
            Ok(()) => {
                self.ui_state.find.input = text;
                self.refresh();
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    /// Entries offered for the cursor row
    pub fn context_menu_items(&self) -> Vec<MenuItem> {
        let Some(event) = self.cursor_event() else {
            return Vec::new();
        };

        let mut items = Vec::new();
        let copy_label = if self.selection.has_multi_selection() {
            format!("Copy {} selected lines", self.selection.selected_set.len())
        } else {
            "Copy line".to_string()
        };
        items.push(MenuItem::new(copy_label, "y", Action::Copy));
        if self.ui_state.grouping.is_grouped() {
            items.push(MenuItem::new("Copy group", "Y", Action::CopyGroup));
        }
        items.push(MenuItem::new("Find by selection", "*", Action::FindBySelection));
        for field in QuickFilterField::ALL {
            if field.value_for(event).is_some() {
                items.push(MenuItem::new(field.label(), "", Action::QuickFilter(field)));
            }
        }
        let expand_label = if self.selection.expanded_index == self.selection.selected_index {
            "Collapse details"
        } else {
            "Expand details"
        };
        items.push(MenuItem::new(expand_label, "enter", Action::ToggleExpand));
        items
    }

    /// Open the context menu for the cursor row
    pub fn open_context_menu(&mut self, anchor: Option<(u16, u16)>) {
        let items = self.context_menu_items();
        self.ui_state.context_menu.open(items, anchor);
    }
}

#[cfg(test)]
mod tests {
    use super::super::state::tests::{invocation_state, raw};
    use super::*;
    use crate::app::clipboard::MemoryClipboard;
    use crate::config::Settings;
    use cloudscope_logs::LogStore;
    use cloudscope_types::LogLevel;

    #[test]
    fn test_find_flow() {
        let mut state = invocation_state();
        state.update(Action::OpenFind);
        assert!(state.ui_state.find.open);
        for c in "BOOM".chars() {
            state.update(Action::FindInput(c));
        }
        state.update(Action::ApplyFind);
        assert!(!state.ui_state.find.open);
        assert_eq!(state.projection().len(), 1);

        state.update(Action::ClearFilter);
        assert_eq!(state.projection().len(), 6);
    }

    #[test]
    fn test_invalid_regex_keeps_find_open() {
        let mut state = invocation_state();
        state.update(Action::OpenFind);
        state.update(Action::FindInput('('));
        state.update(Action::ApplyFind);
        assert!(state.ui_state.find.open);
        assert!(state.ui_state.find.error.is_some());
        assert_eq!(state.projection().len(), 6);
    }

    #[test]
    fn test_case_toggle_recompiles() {
        let mut state = invocation_state();
        state.install_filter("BOOM").unwrap();
        state.refresh();
        assert_eq!(state.projection().len(), 1);
        state.update(Action::ToggleCaseSensitive);
        assert_eq!(state.projection().len(), 0);
    }

    #[test]
    fn test_presets() {
        let mut state = invocation_state();
        state.update(Action::QuietLevels);
        assert!(state.ui_state.active_filter.disabled_levels().contains(&LogLevel::System));
        state.update(Action::ShowAllLevels);
        assert!(state.ui_state.active_filter.disabled_levels().is_empty());
    }

    #[test]
    fn test_quick_filter_from_payload() {
        let store = LogStore::new(100);
        store.extend([
            raw(1, "s1", r#"{"level":"info","requestId":"abc","msg":"one"}"#),
            raw(2, "s1", r#"{"level":"info","requestId":"def","msg":"two"}"#),
        ]);
        let mut state = AppState::with_clipboard(store, Settings::default(), Box::new(MemoryClipboard::default()));

        let items = state.context_menu_items();
        assert!(items.iter().any(|i| i.action == Action::QuickFilter(QuickFilterField::RequestId)));
        assert!(!items.iter().any(|i| i.action == Action::QuickFilter(QuickFilterField::TraceId)));

        state.update(Action::QuickFilter(QuickFilterField::RequestId));
        assert_eq!(state.ui_state.active_filter.pattern(), "metadata.requestId:abc");
        assert_eq!(state.projection().len(), 1);
    }

    #[test]
    fn test_menu_select_dispatches() {
        let mut state = invocation_state();
        state.update(Action::OpenContextMenu);
        assert!(state.ui_state.context_menu.visible);
        state.update(Action::MenuSelect);
        assert!(!state.ui_state.context_menu.visible);
        assert_eq!(state.ui_state.status_message.as_deref(), Some("Copied 1 line(s)"));
    }

    #[test]
    fn test_find_by_selection_is_literal() {
        let mut state = invocation_state();
        // "$LATEST" would be an anchor as a regex
        state.update(Action::FindBySelection);
        assert_eq!(state.projection().len(), 1);
        assert!(!state.ui_state.active_filter.is_field_filter());
    }
}
