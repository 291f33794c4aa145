//! Optional TOML configuration file holding per-user defaults.
//!
//! ```toml
//! prefix = "."
//! on_conflict = "replace"
//! ```
//!
//! Values given on the command line take precedence over the file.
pub mod toml_loader;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::conflict::ConflictPolicy;
use crate::error::ConfigError;

/// Defaults read from the config file.  Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Prefix prepended to every link name.
    pub prefix: Option<String>,
    /// Policy applied when a link destination is occupied.
    pub on_conflict: Option<ConflictPolicy>,
}

impl FileConfig {
    /// Load the config file.
    ///
    /// An `explicit` path must exist.  Without one, the default location
    /// from [`default_path`] is used and a missing file yields an empty
    /// config.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => toml_loader::load_required(path),
            None => toml_loader::load_config(&default_path()),
        }
    }
}

/// `$XDG_CONFIG_HOME/dfi/config.toml`, falling back to `~/.config/dfi/config.toml`.
#[must_use]
pub fn default_path() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map_or_else(|| crate::home_dir().join(".config"), PathBuf::from)
        .join("dfi")
        .join("config.toml")
}
