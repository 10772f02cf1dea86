use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use cloudscope_logs::DEFAULT_CAPACITY;
use cloudscope_types::{GroupingMode, LogLevel};

use crate::ui::RowHeights;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "cloudscope.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Row heights as written in the settings file
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RowHeightSettings {
    pub plain: u16,
    pub detail: u16,
    pub header: u16,
}

impl Default for RowHeightSettings {
    fn default() -> Self {
        let heights = RowHeights::default();
        Self {
            plain: heights.plain,
            detail: heights.detail,
            header: heights.header,
        }
    }
}

impl From<&RowHeightSettings> for RowHeights {
    fn from(settings: &RowHeightSettings) -> Self {
        Self {
            plain: settings.plain.max(1),
            detail: settings.detail.max(1),
            header: settings.header.max(1),
        }
    }
}

/// User settings
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub row_heights: RowHeightSettings,

    /// Cells a press must travel before it becomes a drag
    pub drag_threshold: u16,

    /// Rows moved by page up/down; unset means one screen
    pub page_size: Option<usize>,

    pub default_grouping: GroupingMode,

    /// Levels hidden at startup
    pub disabled_levels: Vec<LogLevel>,

    /// Show whole groups when any member matches the filter
    pub group_filter: bool,

    pub case_insensitive: bool,

    /// Maximum number of retained events
    pub capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            row_heights: RowHeightSettings::default(),
            drag_threshold: 1,
            page_size: None,
            default_grouping: GroupingMode::None,
            disabled_levels: Vec::new(),
            group_filter: false,
            case_insensitive: true,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml(content: &str, origin: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|source| SettingsError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load settings from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Settings file to use when none is given: `cloudscope.toml` in the
    /// working directory, else `$XDG_CONFIG_HOME/cloudscope/config.toml`
    /// (falling back to `~/.config`).
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        let config_home = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(config_home.join("cloudscope").join("config.toml"))
    }

    pub fn row_heights(&self) -> RowHeights {
        RowHeights::from(&self.row_heights)
    }

    pub fn disabled_level_set(&self) -> HashSet<LogLevel> {
        self.disabled_levels.iter().copied().collect()
    }
}
