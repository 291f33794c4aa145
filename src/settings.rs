//! Resolved settings for one run.
use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::FileConfig;
use crate::conflict::ConflictPolicy;
use crate::error::{DfiError, LinkError};
use crate::paths::absolutize;

/// Everything the installer needs, with all precedence applied and every
/// path made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Prefix prepended to every link name.
    pub prefix: String,
    /// Policy for occupied link paths.
    pub on_conflict: ConflictPolicy,
    /// Report instead of changing anything.
    pub dry_run: bool,
    /// Absolute source paths, in order.
    pub source_paths: Vec<PathBuf>,
    /// Absolute destination directory.
    pub dest_path: PathBuf,
}

impl Settings {
    /// Combine command-line flags, the config file and built-in defaults.
    ///
    /// `sources` are the already collected source paths (see
    /// [`sources::collect`](crate::sources::collect)); the destination is the
    /// last positional argument on `cli`.  Command-line values win over the
    /// config file.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotADirectory`] if `cli` names no destination, or
    /// [`LinkError::Io`] if a relative path cannot be made absolute.
    pub fn resolve(cli: &Cli, file: &FileConfig, sources: Vec<PathBuf>) -> Result<Self, DfiError> {
        let dest = cli
            .paths
            .last()
            .ok_or_else(|| LinkError::NotADirectory {
                path: PathBuf::new(),
            })?;

        let source_paths = sources
            .into_iter()
            .map(|p| absolutize(&p).map_err(|e| LinkError::io("absolutize", p, e)))
            .collect::<Result<Vec<_>, _>>()?;
        let dest_path = absolutize(dest).map_err(|e| LinkError::io("absolutize", dest, e))?;

        Ok(Self {
            prefix: cli
                .prefix
                .clone()
                .or_else(|| file.prefix.clone())
                .unwrap_or_default(),
            on_conflict: cli.on_conflict.or(file.on_conflict).unwrap_or_default(),
            dry_run: cli.dry_run,
            source_paths,
            dest_path,
        })
    }
}
