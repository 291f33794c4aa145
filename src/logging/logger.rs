//! Structured logger with dry-run awareness and summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{LinkEntry, LinkStatus, Log};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// `record_link` is not included because its signature differs from the
/// `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// Every message becomes a `tracing` event.  The subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) renders them on
/// the console and appends them to `$XDG_CACHE_HOME/dfi/<command>.log`
/// (default `~/.cache/dfi/<command>.log`) with ANSI codes stripped.
#[derive(Debug)]
pub struct Logger {
    links: Mutex<Vec<LinkEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary.  The file
    /// itself is created by the subscriber's file layer.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            links: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded link entries (test-only).
    #[cfg(test)]
    pub(crate) fn link_entries(&self) -> Vec<LinkEntry> {
        self.links.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record a link result for the summary.
    pub fn record_link(&self, entry: LinkEntry) {
        if let Ok(mut guard) = self.links.lock() {
            guard.push(entry);
        }
    }

    /// Count the recorded links with the given status (test-only).
    #[cfg(test)]
    pub(crate) fn count(&self, status: LinkStatus) -> usize {
        self.links
            .lock()
            .map_or(0, |guard| guard.iter().filter(|e| e.status == status).count())
    }

    /// Print the summary of all recorded links.
    pub fn print_summary(&self) {
        let links = match self.links.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        if links.is_empty() {
            return;
        }

        self.stage("Summary");

        let mut created = 0u32;
        let mut already = 0u32;
        let mut skipped = 0u32;
        let mut dry_run = 0u32;

        for link in &links {
            let (icon, color) = match link.status {
                LinkStatus::Created => {
                    created += 1;
                    ("✓", "\x1b[32m")
                }
                LinkStatus::AlreadyCorrect => {
                    already += 1;
                    ("·", "\x1b[2m")
                }
                LinkStatus::Skipped => {
                    skipped += 1;
                    ("○", "\x1b[33m")
                }
                LinkStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
            };

            let suffix = link
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!(
                "{color}{icon} {} -> {}{suffix}\x1b[0m",
                link.link.display(),
                link.target.display()
            ));
        }

        let total = created + already + skipped + dry_run;
        self.info(&format!(
            "{total} links: \x1b[32m{created} created\x1b[0m, \x1b[2m{already} ok\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record_link(&self, entry: LinkEntry) {
        self.record_link(entry);
    }
}
