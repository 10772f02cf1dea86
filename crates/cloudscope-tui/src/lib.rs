//! Terminal front-end for cloudscope
//!
//! This crate provides the log viewer: state and selection handling,
//! keybindings and settings, terminal event handling, and UI components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, Clipboard, MemoryClipboard, SelectionState, SystemClipboard, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext, Settings, SettingsError};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{ContextMenu, HelpOverlay, StatusBar};
pub use ui::screens::LogViewerScreen;
pub use ui::{RowHeights, Theme, Viewport};
