use ratatui::layout::Rect;
use std::collections::HashSet;
use std::sync::Arc;

use cloudscope_logs::{CompiledFilter, FilterError, LogStore, Projection, ProjectionMemo};
use cloudscope_types::{ArcLogEvent, GroupingMode};

use super::clipboard::{Clipboard, SystemClipboard};
use super::selection::{DragTracker, SelectionState};
use crate::config::Settings;
use crate::ui::components::ContextMenuState;
use crate::ui::{RowHeights, RowLayout, Viewport};

/// Find bar state
#[derive(Clone, Debug, Default)]
pub struct FindState {
    /// Is the find bar open?
    pub open: bool,

    /// Current input text
    pub input: String,

    /// Compile error of the last applied input
    pub error: Option<String>,
}

/// UI-specific transient state
pub struct UiState {
    /// Current grouping mode
    pub grouping: GroupingMode,

    /// Ids of collapsed sections
    pub collapsed: HashSet<String>,

    /// Active text filter together with the hidden levels
    pub active_filter: CompiledFilter,

    /// Case insensitive search?
    pub filter_case_insensitive: bool,

    /// Keep whole groups visible when any member matches the filter
    pub group_filter: bool,

    pub find: FindState,

    pub context_menu: ContextMenuState,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Show statistics panel?
    pub stats_visible: bool,

    /// Transient message for the status bar
    pub status_message: Option<String>,

    /// Error message to display (if any)
    pub error_message: Option<String>,

    /// Display position of the cursor before the last projection change
    pub last_cursor_position: usize,

    /// Screen area of the log list, set while rendering
    pub list_area: Rect,
}

impl UiState {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            grouping: settings.default_grouping,
            collapsed: HashSet::new(),
            active_filter: CompiledFilter::levels_only(settings.disabled_level_set()),
            filter_case_insensitive: settings.case_insensitive,
            group_filter: settings.group_filter,
            find: FindState::default(),
            context_menu: ContextMenuState::default(),
            help_visible: false,
            stats_visible: false,
            status_message: None,
            error_message: None,
            last_cursor_position: 0,
            list_area: Rect::default(),
        }
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Global application state
pub struct AppState {
    /// Ingested events
    pub store: LogStore,

    pub settings: Settings,

    /// UI state
    pub ui_state: UiState,

    /// Cursor, multi-selection and expanded row
    pub selection: SelectionState,

    /// Mouse press/drag tracking
    pub drag: DragTracker,

    /// Scroll position of the log list
    pub viewport: Viewport,

    pub row_heights: RowHeights,

    /// Whether app should quit
    pub should_quit: bool,

    /// Dirty flag for rendering - only render when true
    pub render_dirty: bool,

    pub(crate) memo: ProjectionMemo,
    pub(crate) projection: Arc<Projection>,
    pub(crate) clipboard: Box<dyn Clipboard>,
}

impl AppState {
    pub fn new(store: LogStore, settings: Settings) -> Self {
        Self::with_clipboard(store, settings, Box::new(SystemClipboard::new()))
    }

    pub fn with_clipboard(store: LogStore, settings: Settings, clipboard: Box<dyn Clipboard>) -> Self {
        let mut state = Self {
            store,
            ui_state: UiState::from_settings(&settings),
            selection: SelectionState::default(),
            drag: DragTracker::new(settings.drag_threshold),
            viewport: Viewport::default(),
            row_heights: settings.row_heights(),
            settings,
            should_quit: false,
            render_dirty: true, // Start dirty to ensure initial render
            memo: ProjectionMemo::new(),
            projection: Arc::new(Projection::default()),
            clipboard,
        };
        state.refresh();
        state
    }

    /// Current display projection
    pub fn projection(&self) -> &Arc<Projection> {
        &self.projection
    }

    /// Row geometry of the current projection
    pub fn row_layout(&self) -> RowLayout<'_> {
        row_layout(&self.projection, &self.selection, self.row_heights)
    }

    /// Recompute the projection if any input changed, carrying the selection
    /// over by event identity.
    pub fn refresh(&mut self) {
        let logs = self.store.all();
        let group_filter = self
            .ui_state
            .group_filter
            .then_some(&self.ui_state.active_filter);
        let projection = self.memo.project(
            &logs,
            &self.ui_state.active_filter,
            self.ui_state.grouping,
            &self.ui_state.collapsed,
            group_filter,
        );

        if !Arc::ptr_eq(&projection, &self.projection) {
            let old = std::mem::replace(&mut self.projection, projection);
            let new = &self.projection;
            self.selection
                .remap(|i| old.resolve(i).and_then(|event| new.index_of_event(event.id)));
            self.reconcile_cursor();
            tracing::debug!(
                rows = self.projection.len(),
                headers = self.projection.header_count(),
                synthetic = self.projection.synthetic_count(),
                "projection changed"
            );
            self.render_dirty = true;
        }

        let layout = row_layout(&self.projection, &self.selection, self.row_heights);
        self.viewport.clamp(&layout);
    }

    /// Put the cursor back on a log row: the first at or after the last
    /// known position, else the last one.
    fn reconcile_cursor(&mut self) {
        if let Some(index) = self.selection.selected_index
            && let Some(position) = self.projection.position_of(index)
        {
            self.ui_state.last_cursor_position = position;
            return;
        }

        let from = self.ui_state.last_cursor_position;
        let items = self.projection.items();
        let next = items
            .iter()
            .skip(from)
            .find_map(|item| item.log_index())
            .or_else(|| items.iter().rev().find_map(|item| item.log_index()));
        self.selection.selected_index = next;
        if let Some(index) = next
            && let Some(position) = self.projection.position_of(index)
        {
            self.ui_state.last_cursor_position = position;
        }
    }

    /// Event under the cursor
    pub fn cursor_event(&self) -> Option<&ArcLogEvent> {
        self.selection
            .selected_index
            .and_then(|i| self.projection.resolve(i))
    }

    /// Display position of the cursor
    pub fn cursor_position(&self) -> Option<usize> {
        self.selection
            .selected_index
            .and_then(|i| self.projection.position_of(i))
    }

    /// Show an error message
    pub fn show_error(&mut self, msg: String) {
        tracing::warn!(error = %msg, "showing error");
        self.ui_state.error_message = Some(msg);
    }

    /// Dismiss the error message
    pub fn dismiss_error(&mut self) {
        self.ui_state.error_message = None;
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.ui_state.status_message = Some(msg.into());
    }

    /// Compile `text` as the active filter, keeping the hidden levels
    pub fn install_filter(&mut self, text: &str) -> Result<(), FilterError> {
        let compiled = if self.ui_state.filter_case_insensitive {
            CompiledFilter::new_case_insensitive(text)?
        } else {
            CompiledFilter::new(text)?
        };
        let levels = self.ui_state.active_filter.disabled_levels().clone();
        self.ui_state.active_filter = compiled.with_disabled_levels(levels);
        Ok(())
    }

    /// Drop the text filter, keeping the hidden levels
    pub fn clear_filter(&mut self) {
        let levels = self.ui_state.active_filter.disabled_levels().clone();
        self.ui_state.active_filter = CompiledFilter::levels_only(levels);
        self.ui_state.find.error = None;
    }

    /// Messages of the rows currently in view (headers excluded)
    pub fn export_text(&self) -> String {
        self.projection
            .items()
            .iter()
            .filter_map(|item| item.log())
            .map(|log| log.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub(crate) fn row_layout<'a>(
    projection: &'a Projection,
    selection: &SelectionState,
    heights: RowHeights,
) -> RowLayout<'a> {
    let expanded = selection
        .expanded_index
        .and_then(|i| projection.position_of(i));
    RowLayout::new(projection.items(), expanded, heights)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app::clipboard::MemoryClipboard;
    use cloudscope_logs::RawLogEvent;

    pub(crate) fn raw(ts: i64, stream: &str, message: &str) -> RawLogEvent {
        RawLogEvent {
            timestamp: ts,
            message: message.to_string(),
            log_stream_name: Some(stream.to_string()),
            event_id: None,
        }
    }

    /// Two invocations on one stream, six lines
    pub(crate) fn invocation_state() -> AppState {
        let store = LogStore::new(100);
        store.extend([
            raw(1, "s1", "START RequestId: r1 Version: $LATEST"),
            raw(2, "s1", "hello from r1"),
            raw(3, "s1", "END RequestId: r1"),
            raw(4, "s1", "START RequestId: r2 Version: $LATEST"),
            raw(5, "s1", "boom in r2"),
            raw(6, "s1", "END RequestId: r2"),
        ]);
        let mut state = AppState::with_clipboard(store, Settings::default(), Box::new(MemoryClipboard::default()));
        state.viewport.height = 20;
        state
    }

    #[test]
    fn test_initial_cursor_on_first_row() {
        let state = invocation_state();
        assert_eq!(state.projection().len(), 6);
        assert_eq!(state.selection.selected_index, Some(0));
    }

    #[test]
    fn test_selection_follows_event_across_filter_change() {
        let mut state = invocation_state();
        // cursor on "boom in r2"
        state.selection.selected_index = Some(4);
        state.install_filter("boom|hello").unwrap();
        state.refresh();

        assert_eq!(state.projection().len(), 2);
        assert_eq!(state.cursor_event().unwrap().message, "boom in r2");
        assert_eq!(state.selection.selected_index, Some(1));
    }

    #[test]
    fn test_cursor_moves_to_next_row_when_its_event_vanishes() {
        let mut state = invocation_state();
        state.selection.selected_index = Some(1);
        state.ui_state.last_cursor_position = 1;
        state.install_filter("END").unwrap();
        state.refresh();

        assert_eq!(state.cursor_event().unwrap().message, "END RequestId: r2");
    }

    #[test]
    fn test_refresh_is_memoized() {
        let mut state = invocation_state();
        let before = Arc::clone(state.projection());
        state.refresh();
        assert!(Arc::ptr_eq(&before, state.projection()));
    }

    #[test]
    fn test_clear_filter_keeps_levels() {
        let mut state = invocation_state();
        state.ui_state.active_filter = CompiledFilter::new("x")
            .unwrap()
            .with_disabled_levels([cloudscope_types::LogLevel::Debug].into_iter().collect());
        state.clear_filter();
        assert!(!state.ui_state.active_filter.has_pattern());
        assert_eq!(state.ui_state.active_filter.disabled_levels().len(), 1);
    }
}
