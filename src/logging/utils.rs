//! Small helpers shared by the logger and the subscriber.
use std::path::PathBuf;

/// Timestamp format of the per-run header in the log file.
pub(super) const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Timestamp format prefixed to each log file line.
pub(super) const LINE_TIME_FORMAT: &str = "%H:%M:%S";

/// Remove terminal escape sequences so the log file stays plain text.
///
/// A CSI sequence (`ESC [` ... final byte in `@`..=`~`) is dropped whole;
/// any other escape drops `ESC` and the character after it.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut pieces = s.split('\x1b');
    let mut out = pieces.next().unwrap_or_default().to_string();
    for piece in pieces {
        let rest = match piece.strip_prefix('[') {
            Some(csi) => csi
                .find(|c| ('@'..='~').contains(&c))
                .and_then(|end| csi.get(end + 1..))
                .unwrap_or_default(),
            None => {
                let mut chars = piece.chars();
                chars.next();
                chars.as_str()
            }
        };
        out.push_str(rest);
    }
    out
}

/// `$XDG_CACHE_HOME/dfi/<command>.log` (default `~/.cache/dfi/<command>.log`).
///
/// Creates the directory; returns `None` if that fails.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let dir = std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map_or_else(|| crate::home_dir().join(".cache"), PathBuf::from)
        .join("dfi");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join(command).with_extension("log"))
}

/// The current UTC time rendered with a `strftime` `format`.
pub(super) fn utc_now(format: &str) -> String {
    chrono::Utc::now().format(format).to_string()
}
