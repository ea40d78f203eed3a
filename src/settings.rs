//! Persisted user-scoped settings
//!
//! Settings live in a small JSON file under the user configuration
//! directory. They are re-read from disk at the start of every build rather
//! than cached, so edits take effect on the next build without restarting
//! the host.

use crate::ShieldResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_enable() -> bool {
    true
}

fn default_experimental() -> bool {
    true
}

fn default_callback_order() -> i32 {
    5001
}

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Master switch; `false` makes the gate skip every build
    #[serde(default = "default_enable")]
    pub enable: bool,

    /// Enable the engine's experimental protection layers
    ///
    /// Only honored on the Windows desktop target; the experimental layers
    /// need a native toolchain runtime the other targets do not ship.
    #[serde(default = "default_experimental")]
    pub experimental: bool,

    /// Ordering of this pipeline among the host's build callbacks
    #[serde(default = "default_callback_order")]
    pub callback_order: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable: default_enable(),
            experimental: default_experimental(),
            callback_order: default_callback_order(),
        }
    }
}

/// On-disk store for [`Settings`]
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at the default per-user location
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            path: base.join("metashield").join("settings.json"),
        }
    }

    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read settings from disk
    ///
    /// A missing file yields the defaults; an unreadable or malformed file
    /// is logged and also yields the defaults, so a corrupted settings file
    /// can never stop a build.
    pub fn load(&self) -> Settings {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Settings::default(),
            Err(e) => {
                tracing::warn!("failed to read settings from \"{}\": {}", self.path.display(), e);
                return Settings::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(
                    "malformed settings at \"{}\": {}; using defaults",
                    self.path.display(),
                    e
                );
                Settings::default()
            }
        }
    }

    /// Write settings to disk, creating parent directories as needed
    pub fn save(&self, settings: &Settings) -> ShieldResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}
