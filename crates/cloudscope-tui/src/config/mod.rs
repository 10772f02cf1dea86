//! Keybindings and user settings

mod keybindings;
mod settings;

pub use keybindings::{KeyBinding, KeyBindings, KeyContext};
pub use settings::{LOCAL_CONFIG_FILE, RowHeightSettings, Settings, SettingsError};
