use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;
use cloudscope_types::LogLevel;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    LogViewer,
    FindInput,
    ContextMenu,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::Escape);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Log viewer bindings - less-like navigation
        let mut log_viewer = HashMap::new();
        // Line navigation
        log_viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::MoveDown);
        log_viewer.insert(KeyBinding::new(KeyCode::Down), Action::MoveDown);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::MoveUp);
        log_viewer.insert(KeyBinding::new(KeyCode::Up), Action::MoveUp);
        // Page navigation (less-style)
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('b')), Action::PageUp);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        log_viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        // Top/bottom navigation (less-style)
        log_viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::MoveToTop);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::MoveToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Home), Action::MoveToTop);
        log_viewer.insert(KeyBinding::new(KeyCode::End), Action::MoveToBottom);
        // Rows and groups
        log_viewer.insert(KeyBinding::new(KeyCode::Enter), Action::ToggleExpand);
        log_viewer.insert(KeyBinding::new(KeyCode::Char(' ')), Action::ToggleExpand);
        log_viewer.insert(KeyBinding::new(KeyCode::Tab), Action::ToggleGroup);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('z')), Action::ToggleAllGroups);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('v')), Action::CycleGrouping);
        // Clipboard
        log_viewer.insert(KeyBinding::new(KeyCode::Char('y')), Action::Copy);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Copy);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('Y')), Action::CopyGroup);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('a')), Action::SelectAll);
        // Find
        log_viewer.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenFind);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('f')), Action::OpenFind);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('n')), Action::ClearFilter);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('i')), Action::ToggleCaseSensitive);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('w')), Action::ToggleGroupFilter);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('*')), Action::FindBySelection);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('*')), Action::FindBySelection);
        // Levels
        for (digit, level) in ('1'..='8').zip(LogLevel::ALL) {
            log_viewer.insert(KeyBinding::new(KeyCode::Char(digit)), Action::ToggleLevel(level));
        }
        log_viewer.insert(KeyBinding::new(KeyCode::Char('0')), Action::ShowAllLevels);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('E')), Action::ErrorsOnly);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('Q')), Action::QuietLevels);
        // Misc
        log_viewer.insert(KeyBinding::new(KeyCode::Char('m')), Action::OpenContextMenu);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('s')), Action::ToggleStats);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('e')), Action::ExportLogs);
        bindings.insert(KeyContext::LogViewer, log_viewer);

        // Find input bindings (when the find bar is open)
        let mut find_input = HashMap::new();
        find_input.insert(KeyBinding::new(KeyCode::Enter), Action::ApplyFind);
        find_input.insert(KeyBinding::new(KeyCode::Esc), Action::Escape);
        find_input.insert(KeyBinding::new(KeyCode::Backspace), Action::FindBackspace);
        find_input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::FindClear);
        find_input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Escape);
        bindings.insert(KeyContext::FindInput, find_input);

        // Context menu bindings
        let mut menu = HashMap::new();
        menu.insert(KeyBinding::new(KeyCode::Up), Action::MenuUp);
        menu.insert(KeyBinding::new(KeyCode::Down), Action::MenuDown);
        menu.insert(KeyBinding::new(KeyCode::Char('k')), Action::MenuUp);
        menu.insert(KeyBinding::new(KeyCode::Char('j')), Action::MenuDown);
        menu.insert(KeyBinding::new(KeyCode::Enter), Action::MenuSelect);
        menu.insert(KeyBinding::new(KeyCode::Esc), Action::Escape);
        menu.insert(KeyBinding::new(KeyCode::Char('m')), Action::Escape);
        bindings.insert(KeyContext::ContextMenu, menu);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|context_bindings| context_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Menus swallow everything else
        if context == KeyContext::ContextMenu {
            return None;
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event in find input mode
    /// Returns Some(Action) for special keys, None for regular character input
    pub fn get_find_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::FindInput)
            .and_then(|find_bindings| find_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // For regular characters, return FindInput action
        if let KeyCode::Char(c) = key.code
            && (key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT)
        {
            return Some(Action::FindInput(c));
        }

        None
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
