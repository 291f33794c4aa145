//! Core logging types: link entries, status, and the [`Log`] trait.
use std::fmt;
use std::path::PathBuf;

/// Per-link result for summary reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Where the symlink lives (or would live).
    pub link: PathBuf,
    /// What the symlink points to.
    pub target: PathBuf,
    /// Final status of the link.
    pub status: LinkStatus,
    /// Optional detail message (e.g. skip reason).
    pub message: Option<String>,
}

/// Status of a processed link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// The symlink was created.
    Created,
    /// The symlink already pointed at its source.
    AlreadyCorrect,
    /// The destination was occupied and left alone.
    Skipped,
    /// Dry-run mode; the symlink would have been created.
    DryRun,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) emits `tracing` events for the console
/// and log file; [`MemoryLog`](super::memory::MemoryLog) keeps everything in
/// memory.  Link code logs through this trait without knowing which one it
/// has.
pub trait Log: Send + Sync + fmt::Debug {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a link result for the summary.
    fn record_link(&self, entry: LinkEntry);
}
