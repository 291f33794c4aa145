//! Command-line argument definitions.
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::conflict::ConflictPolicy;
use crate::sources::Separator;

/// Command-line interface of the dotfile linker.
#[derive(Parser, Debug)]
#[command(
    name = "dfi",
    about = "Links version-controlled dotfiles into place as relative symlinks",
    long_about = "Creates a symlink in DEST for every SOURCE.\n\n\
        Two sources with the same file name are an error.  A SOURCE of '-' reads \
        source paths from stdin, one per line, or NUL-separated with -z.\n\n\
        When a link path is already occupied, --on-conflict decides what happens:\n  \
        backup   move it aside to <name>.bak_<timestamp>_<n>, then link (alias: rename)\n  \
        replace  delete the file or symlink, then link (never deletes directories)\n  \
        warn     print a warning and leave it\n  \
        fail     stop with an error",
    version = crate::VERSION
)]
pub struct Cli {
    /// Sources followed by the destination directory
    #[arg(value_name = "SOURCES... DEST", num_args = 2.., required = true)]
    pub paths: Vec<PathBuf>,

    /// Prefix for link names, e.g. '.' for dotfiles
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// What to do when a link path exists: backup, replace, warn, fail
    #[arg(short = 'C', long, value_name = "POLICY")]
    pub on_conflict: Option<ConflictPolicy>,

    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Source lists read from stdin are NUL-separated
    #[arg(short = 'z', long = "null")]
    pub null: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file (default: $XDG_CONFIG_HOME/dfi/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Split the positional paths into sources and the destination.
    ///
    /// Returns `None` if fewer than two paths were given.
    #[must_use]
    pub fn split_paths(&self) -> Option<(&[PathBuf], &Path)> {
        match self.paths.split_last() {
            Some((dest, sources)) if !sources.is_empty() => Some((sources, dest.as_path())),
            _ => None,
        }
    }

    /// Separator used for source lists read from stdin.
    #[must_use]
    pub const fn separator(&self) -> Separator {
        if self.null {
            Separator::Nul
        } else {
            Separator::Newline
        }
    }
}
