//! In-memory logger that captures messages instead of printing them.
use std::sync::Mutex;

use super::types::{Log, LinkEntry};

/// Severity or kind of a captured message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// A stage header.
    Stage,
    /// An informational message.
    Info,
    /// A debug message.
    Debug,
    /// A warning.
    Warn,
    /// An error.
    Error,
    /// A dry-run action.
    DryRun,
}

/// Implement the display methods of [`Log`] by pushing each message into
/// `self.messages` tagged with the matching [`LogLevel`].
macro_rules! capture_log_methods {
    ($($method:ident => $level:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                if let Ok(mut guard) = self.messages.lock() {
                    guard.push((LogLevel::$level, msg.to_string()));
                }
            }
        )+
    };
}

/// Logger that keeps every message and link record in memory.
///
/// Useful when embedding the installer in another program, or anywhere the
/// caller wants to inspect what was logged rather than show it.
#[derive(Debug, Default)]
pub struct MemoryLog {
    messages: Mutex<Vec<(LogLevel, String)>>,
    links: Mutex<Vec<LinkEntry>>,
}

impl MemoryLog {
    /// Create an empty in-memory logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages, in the order they were logged.
    #[must_use]
    pub fn messages(&self) -> Vec<(LogLevel, String)> {
        self.messages.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Captured messages of a single level.
    #[must_use]
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    /// All recorded link entries.
    #[must_use]
    pub fn links(&self) -> Vec<LinkEntry> {
        self.links.lock().map_or_else(|_| vec![], |g| g.clone())
    }
}

impl Log for MemoryLog {
    capture_log_methods! {
        stage   => Stage,
        info    => Info,
        debug   => Debug,
        warn    => Warn,
        error   => Error,
        dry_run => DryRun,
    }

    fn record_link(&self, entry: LinkEntry) {
        if let Ok(mut guard) = self.links.lock() {
            guard.push(entry);
        }
    }
}
