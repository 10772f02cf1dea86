//! Application state and actions

mod action;
mod clipboard;
mod handler;
mod mouse;
mod navigation;
mod selection;
mod state;

pub use action::Action;
pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard, SystemClipboard};
pub use selection::{DragOutcome, DragTracker, SelectionState};
pub use state::{AppState, FindState, UiState};
