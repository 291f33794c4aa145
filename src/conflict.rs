//! Conflict resolution for occupied link destinations.
//!
//! A [`ConflictPolicy`] is chosen once per run.  When the applier finds
//! something other than the expected symlink at a link path it calls
//! [`ConflictPolicy::handle`], which either clears the way ([`Resolution::Retry`]),
//! leaves the entry alone ([`Resolution::Skip`]) or aborts with an error.
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::{ConfigError, LinkError};
use crate::logging::Log;
use crate::operations::{FileKind, FileSystemOps};

/// Number of backup names tried before giving up.
pub const MAX_BACKUP_ATTEMPTS: u32 = 100;

/// `strftime` format of the timestamp embedded in backup names.
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// What to do when a link destination is already occupied.
///
/// # Examples
///
/// ```
/// use dfi_cli::conflict::ConflictPolicy;
///
/// assert_eq!("Replace".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Replace);
/// assert_eq!("rename".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Backup);
/// assert!("explode".parse::<ConflictPolicy>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Move the occupying entry aside to a timestamped name, then link.
    #[default]
    Backup,
    /// Delete the occupying file or symlink, then link.
    Replace,
    /// Log a warning and leave the destination alone.
    Warn,
    /// Abort the run.
    Fail,
}

/// Outcome of a successful [`ConflictPolicy::handle`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The destination was cleared (or would be); inspect it again.
    Retry,
    /// The destination stays as it is; do not link.
    Skip,
}

impl FromStr for ConflictPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backup" | "rename" => Ok(Self::Backup),
            "replace" => Ok(Self::Replace),
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            _ => Err(ConfigError::InvalidConflictPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Backup => "backup",
            Self::Replace => "replace",
            Self::Warn => "warn",
            Self::Fail => "fail",
        };
        f.write_str(name)
    }
}

impl<'de> Deserialize<'de> for ConflictPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl ConflictPolicy {
    /// Resolve the conflict at `path` according to this policy.
    ///
    /// In dry-run mode `Backup` and `Replace` perform the same checks as a
    /// real run and log what they would do, but change nothing.
    ///
    /// # Errors
    ///
    /// - [`LinkError::ConflictFailPolicy`] under [`ConflictPolicy::Fail`]
    /// - [`LinkError::UnsupportedFileType`] if a backup target is not a
    ///   symlink, file or directory
    /// - [`LinkError::BackupExhausted`] if every backup name is taken
    /// - [`LinkError::DirectoryNotReplaced`] if `Replace` meets a directory
    /// - [`LinkError::Io`] on any other filesystem failure
    pub fn handle(
        self,
        path: &Path,
        fs: &dyn FileSystemOps,
        log: &dyn Log,
        dry_run: bool,
    ) -> Result<Resolution, LinkError> {
        match self {
            Self::Backup => backup(path, fs, log, dry_run),
            Self::Replace => replace(path, fs, log, dry_run),
            Self::Warn => {
                log.warn(&format!("destination {} exists, skipping", path.display()));
                Ok(Resolution::Skip)
            }
            Self::Fail => Err(LinkError::ConflictFailPolicy {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// `<path>.bak_<stamp>_<attempt>`, next to the original.
fn backup_name(path: &Path, stamp: &str, attempt: u32) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".bak_{stamp}_{attempt}"));
    PathBuf::from(name)
}

/// Returns `Ok(None)` if nothing is at `path`.
fn lstat_kind(fs: &dyn FileSystemOps, path: &Path) -> Result<Option<FileKind>, LinkError> {
    match fs.lstat(path) {
        Ok(stat) => Ok(Some(stat.kind)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(LinkError::io("lstat", path, e)),
    }
}

fn backup(
    path: &Path,
    fs: &dyn FileSystemOps,
    log: &dyn Log,
    dry_run: bool,
) -> Result<Resolution, LinkError> {
    let Some(kind) = lstat_kind(fs, path)? else {
        return Ok(Resolution::Retry);
    };
    if !matches!(kind, FileKind::Symlink | FileKind::File | FileKind::Dir) {
        return Err(LinkError::UnsupportedFileType {
            path: path.to_path_buf(),
            kind: kind.to_string(),
        });
    }

    let stamp = chrono::Local::now()
        .format(BACKUP_TIMESTAMP_FORMAT)
        .to_string();

    for attempt in 0..MAX_BACKUP_ATTEMPTS {
        let candidate = backup_name(path, &stamp, attempt);
        if lstat_kind(fs, &candidate)?.is_some() {
            continue;
        }

        if dry_run {
            log.dry_run(&format!(
                "would move {} to {}",
                path.display(),
                candidate.display()
            ));
            return Ok(Resolution::Retry);
        }

        match fs.rename(path, &candidate) {
            Ok(()) => {
                log.info(&format!(
                    "moved {} to {}",
                    path.display(),
                    candidate.display()
                ));
                return Ok(Resolution::Retry);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(LinkError::io("rename", path, e)),
        }
    }

    Err(LinkError::BackupExhausted {
        path: path.to_path_buf(),
        attempts: MAX_BACKUP_ATTEMPTS,
    })
}

fn replace(
    path: &Path,
    fs: &dyn FileSystemOps,
    log: &dyn Log,
    dry_run: bool,
) -> Result<Resolution, LinkError> {
    match lstat_kind(fs, path)? {
        None => return Ok(Resolution::Retry),
        Some(FileKind::Dir) => {
            return Err(LinkError::DirectoryNotReplaced {
                path: path.to_path_buf(),
            });
        }
        Some(_) => {}
    }

    if dry_run {
        log.dry_run(&format!("would remove {}", path.display()));
        return Ok(Resolution::Retry);
    }

    fs.remove(path)
        .map_err(|e| LinkError::io("remove", path, e))?;
    log.info(&format!("removed {}", path.display()));
    Ok(Resolution::Retry)
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLog};
    use crate::operations::{FileId, FileStat, MockFileSystemOps, SystemFileSystemOps};

    fn stat_of(kind: FileKind) -> FileStat {
        FileStat {
            kind,
            id: FileId::Inode { dev: 1, ino: 7 },
        }
    }

    fn not_found() -> io::Error {
        io::Error::from(io::ErrorKind::NotFound)
    }

    /// Names of every entry in `dir` starting with `prefix`.
    fn entries_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(prefix))
            .collect();
        names.sort();
        names
    }

    // ------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("BACKUP".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Backup);
        assert_eq!("Warn".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Warn);
        assert_eq!("fail".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Fail);
    }

    #[test]
    fn parse_rename_aliases_backup() {
        assert_eq!("Rename".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Backup);
    }

    #[test]
    fn parse_unknown_is_invalid_policy() {
        let err = "overwrite".parse::<ConflictPolicy>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConflictPolicy(ref s) if s == "overwrite"));
    }

    #[test]
    fn default_is_backup() {
        assert_eq!(ConflictPolicy::default(), ConflictPolicy::Backup);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for policy in [
            ConflictPolicy::Backup,
            ConflictPolicy::Replace,
            ConflictPolicy::Warn,
            ConflictPolicy::Fail,
        ] {
            assert_eq!(policy.to_string().parse::<ConflictPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn deserializes_from_toml_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            on_conflict: ConflictPolicy,
        }
        let w: Wrapper = toml::from_str("on_conflict = \"Replace\"").unwrap();
        assert_eq!(w.on_conflict, ConflictPolicy::Replace);
        let err = toml::from_str::<Wrapper>("on_conflict = \"nope\"")
            .err()
            .expect("invalid policy should not deserialize");
        assert!(err.to_string().contains("invalid conflict policy"));
    }

    #[test]
    fn backup_name_appends_stamp_and_attempt() {
        assert_eq!(
            backup_name(Path::new("/h/.bashrc"), "20240102030405", 3),
            PathBuf::from("/h/.bashrc.bak_20240102030405_3")
        );
    }

    // ------------------------------------------------------------------
    // Warn / Fail
    // ------------------------------------------------------------------

    #[test]
    fn warn_skips_and_logs() {
        let fs = MockFileSystemOps::new();
        let log = MemoryLog::new();
        let res = ConflictPolicy::Warn
            .handle(Path::new("/h/.zshrc"), &fs, &log, false)
            .unwrap();
        assert_eq!(res, Resolution::Skip);
        assert_eq!(
            log.messages_at(LogLevel::Warn),
            vec!["destination /h/.zshrc exists, skipping"]
        );
    }

    #[test]
    fn fail_returns_error_without_touching_fs() {
        let fs = MockFileSystemOps::new();
        let log = MemoryLog::new();
        let err = ConflictPolicy::Fail
            .handle(Path::new("/h/.zshrc"), &fs, &log, false)
            .unwrap_err();
        assert!(matches!(err, LinkError::ConflictFailPolicy { ref path } if path == Path::new("/h/.zshrc")));
    }

    // ------------------------------------------------------------------
    // Backup
    // ------------------------------------------------------------------

    #[test]
    fn backup_moves_file_aside() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".bashrc");
        std::fs::write(&target, "old").unwrap();

        let log = MemoryLog::new();
        let res = ConflictPolicy::Backup
            .handle(&target, &SystemFileSystemOps, &log, false)
            .unwrap();

        assert_eq!(res, Resolution::Retry);
        assert!(target.symlink_metadata().is_err());
        let backups = entries_with_prefix(dir.path(), ".bashrc.bak_");
        assert_eq!(backups.len(), 1);
        assert!(backups[0].ends_with("_0"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(&backups[0])).unwrap(),
            "old"
        );
    }

    #[test]
    fn backup_moves_directory_aside() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("inner"), "x").unwrap();

        let res = ConflictPolicy::Backup
            .handle(&target, &SystemFileSystemOps, &MemoryLog::new(), false)
            .unwrap();

        assert_eq!(res, Resolution::Retry);
        let backups = entries_with_prefix(dir.path(), "config.bak_");
        assert_eq!(backups.len(), 1);
        assert!(dir.path().join(&backups[0]).join("inner").is_file());
    }

    #[test]
    fn backup_dry_run_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".vimrc");
        std::fs::write(&target, "keep").unwrap();

        let log = MemoryLog::new();
        let res = ConflictPolicy::Backup
            .handle(&target, &SystemFileSystemOps, &log, true)
            .unwrap();

        assert_eq!(res, Resolution::Retry);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "keep");
        assert!(entries_with_prefix(dir.path(), ".vimrc.bak_").is_empty());
        let lines = log.messages_at(LogLevel::DryRun);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("would move "));
    }

    #[test]
    fn backup_of_vanished_path_retries() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|_| Err(not_found()));
        fs.expect_rename().never();
        let res = ConflictPolicy::Backup
            .handle(Path::new("/h/.gone"), &fs, &MemoryLog::new(), false)
            .unwrap();
        assert_eq!(res, Resolution::Retry);
    }

    #[test]
    fn backup_rejects_fifo() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|_| Ok(stat_of(FileKind::Fifo)));
        fs.expect_rename().never();
        let err = ConflictPolicy::Backup
            .handle(Path::new("/h/.pipe"), &fs, &MemoryLog::new(), false)
            .unwrap_err();
        match err {
            LinkError::UnsupportedFileType { path, kind } => {
                assert_eq!(path, PathBuf::from("/h/.pipe"));
                assert_eq!(kind, "fifo");
            }
            other => panic!("expected UnsupportedFileType, got {other:?}"),
        }
    }

    #[test]
    fn backup_skips_taken_names() {
        let target = Path::new("/h/.bashrc");
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|p: &Path| {
            let s = p.to_string_lossy();
            if s == "/h/.bashrc" || s.ends_with("_0") || s.ends_with("_1") {
                Ok(stat_of(FileKind::File))
            } else {
                Err(not_found())
            }
        });
        fs.expect_rename()
            .withf(|from: &Path, to: &Path| {
                from == Path::new("/h/.bashrc") && to.to_string_lossy().ends_with("_2")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let res = ConflictPolicy::Backup
            .handle(target, &fs, &MemoryLog::new(), false)
            .unwrap();
        assert_eq!(res, Resolution::Retry);
    }

    #[test]
    fn backup_retries_when_rename_races() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|p: &Path| {
            if p == Path::new("/h/.bashrc") {
                Ok(stat_of(FileKind::File))
            } else {
                Err(not_found())
            }
        });
        let mut calls = 0;
        fs.expect_rename().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Err(io::Error::from(io::ErrorKind::AlreadyExists))
            } else {
                Ok(())
            }
        });

        let res = ConflictPolicy::Backup
            .handle(Path::new("/h/.bashrc"), &fs, &MemoryLog::new(), false)
            .unwrap();
        assert_eq!(res, Resolution::Retry);
    }

    #[test]
    fn backup_exhausts_after_max_attempts() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|_| Ok(stat_of(FileKind::File)));
        fs.expect_rename().never();
        let err = ConflictPolicy::Backup
            .handle(Path::new("/h/.bashrc"), &fs, &MemoryLog::new(), false)
            .unwrap_err();
        assert!(matches!(
            err,
            LinkError::BackupExhausted { attempts, .. } if attempts == MAX_BACKUP_ATTEMPTS
        ));
    }

    #[test]
    fn backup_surfaces_rename_failure() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|p: &Path| {
            if p == Path::new("/h/.bashrc") {
                Ok(stat_of(FileKind::Symlink))
            } else {
                Err(not_found())
            }
        });
        fs.expect_rename()
            .returning(|_, _| Err(io::Error::from(io::ErrorKind::PermissionDenied)));
        let err = ConflictPolicy::Backup
            .handle(Path::new("/h/.bashrc"), &fs, &MemoryLog::new(), false)
            .unwrap_err();
        assert!(matches!(err, LinkError::Io { op: "rename", .. }));
    }

    // ------------------------------------------------------------------
    // Replace
    // ------------------------------------------------------------------

    #[test]
    fn replace_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".profile");
        std::fs::write(&target, "old").unwrap();

        let log = MemoryLog::new();
        let res = ConflictPolicy::Replace
            .handle(&target, &SystemFileSystemOps, &log, false)
            .unwrap();

        assert_eq!(res, Resolution::Retry);
        assert!(target.symlink_metadata().is_err());
        assert_eq!(log.messages_at(LogLevel::Info).len(), 1);
    }

    #[test]
    fn replace_refuses_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");
        std::fs::create_dir(&target).unwrap();

        let err = ConflictPolicy::Replace
            .handle(&target, &SystemFileSystemOps, &MemoryLog::new(), false)
            .unwrap_err();

        assert!(matches!(err, LinkError::DirectoryNotReplaced { .. }));
        assert!(target.is_dir());
    }

    #[test]
    fn replace_dry_run_refuses_directory_too() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|_| Ok(stat_of(FileKind::Dir)));
        fs.expect_remove().never();
        let err = ConflictPolicy::Replace
            .handle(Path::new("/h/config"), &fs, &MemoryLog::new(), true)
            .unwrap_err();
        assert!(matches!(err, LinkError::DirectoryNotReplaced { .. }));
    }

    #[test]
    fn replace_dry_run_keeps_file() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|_| Ok(stat_of(FileKind::Symlink)));
        fs.expect_remove().never();
        let log = MemoryLog::new();
        let res = ConflictPolicy::Replace
            .handle(Path::new("/h/.bashrc"), &fs, &log, true)
            .unwrap();
        assert_eq!(res, Resolution::Retry);
        assert_eq!(log.messages_at(LogLevel::DryRun), vec!["would remove /h/.bashrc"]);
    }
}
