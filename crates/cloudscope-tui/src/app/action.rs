use cloudscope_logs::QuickFilterField;
use cloudscope_types::{GroupingMode, LogLevel};

/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Quit,
    ToggleHelp,

    /// Dismiss the topmost overlay or selection
    Escape,

    // Cursor movement
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    MoveToTop,
    MoveToBottom,

    // Rows and groups
    ToggleExpand,
    ToggleGroup,
    ToggleAllGroups,
    CycleGrouping,
    SetGrouping(GroupingMode),

    // Selection and clipboard
    Copy,
    CopyGroup,
    SelectAll,

    // Find / filter
    OpenFind,
    FindInput(char),
    FindBackspace,
    FindClear,
    ApplyFind,
    ClearFilter,
    ToggleCaseSensitive,
    ToggleGroupFilter,
    FindBySelection,
    QuickFilter(QuickFilterField),

    // Level filter
    ToggleLevel(LogLevel),
    ErrorsOnly,
    QuietLevels,
    ShowAllLevels,

    // Context menu
    OpenContextMenu,
    MenuUp,
    MenuDown,
    MenuSelect,

    ToggleStats,
    ExportLogs,

    // Error handling
    ShowError(String),
    DismissError,

    // Render request
    Render,
}
