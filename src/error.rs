//! Domain-specific error types for the link installer.
//!
//! Library modules return typed errors built with [`thiserror`]; the command
//! handler at the CLI boundary converts them to [`anyhow::Error`] via the
//! standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! DfiError
//! ├── Config(ConfigError)  config file and conflict policy parsing
//! ├── Source(SourceError)  stdin source lists, wildcard expansion
//! └── Link(LinkError)      planning, conflict resolution, symlink creation
//! ```
//!
//! Every variant carries the offending path(s) so a failed run can be
//! diagnosed from its error message alone.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the link installer.
#[derive(Error, Debug)]
pub enum DfiError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Source list error (stdin, wildcard expansion).
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Link planning or installation error.
    #[error("Link error: {0}")]
    Link(#[from] LinkError),
}

/// Errors that arise from configuration loading and option parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The conflict policy name is not one of the known policies.
    #[error("invalid conflict policy '{0}': must be one of backup, rename, replace, warn, fail")]
    InvalidConflictPolicy(String),

    /// The config file could not be read.
    #[error("IO error reading config file {}: {source}", path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unexpected keys.
    #[error("invalid config file {}: {message}", path.display())]
    Parse {
        /// Path to the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// Errors that arise while collecting source paths.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Reading the source list from stdin failed.
    #[error("failed to read source list: {0}")]
    Read(#[source] std::io::Error),

    /// A wildcard source matched nothing.
    #[error("no sources match pattern {}", pattern.display())]
    NoMatches {
        /// The pattern as given.
        pattern: PathBuf,
    },

    /// Listing the directory of a wildcard source failed.
    #[error("failed to list {}: {source}", path.display())]
    Io {
        /// Directory that could not be listed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while planning or installing links.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The destination is missing or is not a directory.
    #[error("destination is not a directory: {}", path.display())]
    NotADirectory {
        /// The destination path.
        path: PathBuf,
    },

    /// Two distinct sources would produce the same link name.
    #[error(
        "duplicate link name '{name}': {} and {} would both be linked there",
        first.display(),
        second.display()
    )]
    DuplicateLinkName {
        /// The colliding link file name (prefix applied).
        name: String,
        /// The first source that claimed the name.
        first: PathBuf,
        /// The second source that collided with it.
        second: PathBuf,
    },

    /// A source path has no final component to name the link after.
    #[error("source has no file name: {}", path.display())]
    NoFileName {
        /// The offending source path.
        path: PathBuf,
    },

    /// The link path is the source path itself.
    #[error("link {} would replace its own source", path.display())]
    LinkIsSource {
        /// The shared path.
        path: PathBuf,
    },

    /// One path cannot be expressed relative to the other.
    #[error("cannot express {} relative to {}", target.display(), base.display())]
    Path {
        /// The base directory.
        base: PathBuf,
        /// The path to relativize.
        target: PathBuf,
    },

    /// A conflicting entry is not a symlink, regular file or directory.
    #[error("destination {} is a {kind}, cannot back up", path.display())]
    UnsupportedFileType {
        /// The occupied destination.
        path: PathBuf,
        /// Human-readable file kind (e.g. `"fifo"`).
        kind: String,
    },

    /// Every candidate backup name was already taken.
    #[error("failed to back up {} after {attempts} attempts", path.display())]
    BackupExhausted {
        /// The occupied destination.
        path: PathBuf,
        /// Number of backup names tried.
        attempts: u32,
    },

    /// The `fail` conflict policy met an occupied destination.
    #[error("destination {} exists, exiting", path.display())]
    ConflictFailPolicy {
        /// The occupied destination.
        path: PathBuf,
    },

    /// The `replace` conflict policy met a real directory.
    #[error("destination {} is a directory, refusing to remove it", path.display())]
    DirectoryNotReplaced {
        /// The occupied destination.
        path: PathBuf,
    },

    /// The destination was still occupied after repeated resolution.
    #[error("destination {} still occupied after {attempts} resolution attempts", path.display())]
    ConflictUnresolved {
        /// The occupied destination.
        path: PathBuf,
        /// Number of resolution passes made.
        attempts: u32,
    },

    /// The applier reached a file type it never expects to see.
    #[error("internal error: unexpected {kind} at {}", path.display())]
    InvariantViolation {
        /// The destination path.
        path: PathBuf,
        /// Human-readable file kind.
        kind: String,
    },

    /// Any other filesystem failure.
    #[error("{op} failed for {}: {source}", path.display())]
    Io {
        /// The operation that failed (e.g. `"symlink"`).
        op: &'static str,
        /// The path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl LinkError {
    /// Wrap an I/O error with the operation and path that produced it.
    #[must_use]
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
