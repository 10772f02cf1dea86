mod context_menu;
mod help_overlay;
mod status_bar;

pub use context_menu::{ContextMenu, ContextMenuState, MenuItem};
pub use help_overlay::HelpOverlay;
pub use status_bar::{StatusBar, log_viewer_hints};
