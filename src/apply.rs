//! Link application: make each planned symlink exist, idempotently.
//!
//! For every [`LinkDescriptor`] the applier inspects the link path without
//! following symlinks and then either creates the link, leaves a correct one
//! alone, or hands the occupied path to the [`ConflictPolicy`].  After a
//! successful resolution the path is inspected again, at most
//! [`MAX_RESOLUTIONS`] times.
use std::io;
use std::path::Path;

use crate::conflict::{ConflictPolicy, Resolution};
use crate::error::LinkError;
use crate::logging::{LinkEntry, LinkStatus, Log};
use crate::operations::{FileKind, FileStat, FileSystemOps};
use crate::plan::LinkDescriptor;

/// Number of conflict resolutions allowed for a single link before giving up.
pub const MAX_RESOLUTIONS: u32 = 3;

/// What currently occupies a link path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestState {
    /// Nothing is there.
    Absent,
    /// A symlink that resolves to the link's source.
    Linked,
    /// A symlink that resolves elsewhere, or nowhere.
    ForeignSymlink,
    /// A regular file.
    File,
    /// A real directory.
    Directory,
    /// A device, socket, fifo or unknown entry.
    Other(FileKind),
}

/// Terminal result of applying one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The symlink was created (or, in a dry run, would be).
    Created,
    /// The symlink already resolved to the source.
    AlreadyCorrect,
    /// The destination was occupied and the policy chose to leave it.
    Skipped {
        /// Why the link was not created.
        reason: String,
    },
}

/// Per-descriptor outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct Report {
    /// Each applied descriptor paired with its outcome.
    pub outcomes: Vec<(LinkDescriptor, LinkOutcome)>,
}

impl Report {
    /// Number of links created (or that would be created in a dry run).
    #[must_use]
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::Created))
    }

    /// Number of links that were already correct.
    #[must_use]
    pub fn already_correct(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::AlreadyCorrect))
    }

    /// Number of links skipped by the conflict policy.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&LinkOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Applies link descriptors through an injected filesystem and logger.
#[derive(Debug)]
pub struct LinkApplier<'a> {
    fs: &'a dyn FileSystemOps,
    log: &'a dyn Log,
    policy: ConflictPolicy,
    dry_run: bool,
}

impl<'a> LinkApplier<'a> {
    /// Create an applier.  With `dry_run` nothing on disk is changed.
    #[must_use]
    pub const fn new(
        fs: &'a dyn FileSystemOps,
        log: &'a dyn Log,
        policy: ConflictPolicy,
        dry_run: bool,
    ) -> Self {
        Self {
            fs,
            log,
            policy,
            dry_run,
        }
    }

    /// Classify whatever is at `descriptor.link_path`.
    ///
    /// A symlink counts as [`DestState::Linked`] only when both it and the
    /// source resolve to the same underlying file.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Io`] if the link path cannot be inspected, or if
    /// the source cannot be inspected for a reason other than not existing.
    /// A symlink that cannot be followed at all (dangling, looping, passing
    /// through a file) is foreign.
    pub fn inspect(&self, descriptor: &LinkDescriptor) -> Result<DestState, LinkError> {
        let link_path = &descriptor.link_path;
        let stat = match self.fs.lstat(link_path) {
            Ok(stat) => stat,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DestState::Absent),
            Err(e) => return Err(LinkError::io("lstat", link_path, e)),
        };

        Ok(match stat.kind {
            FileKind::Symlink => {
                let Ok(resolved) = self.fs.stat(link_path) else {
                    return Ok(DestState::ForeignSymlink);
                };
                let Some(source) = self.stat_if_exists(&descriptor.source_path)? else {
                    return Ok(DestState::ForeignSymlink);
                };
                if self.fs.same_file(&resolved, &source) {
                    DestState::Linked
                } else {
                    DestState::ForeignSymlink
                }
            }
            FileKind::File => DestState::File,
            FileKind::Dir => DestState::Directory,
            other => DestState::Other(other),
        })
    }

    fn stat_if_exists(&self, path: &Path) -> Result<Option<FileStat>, LinkError> {
        match self.fs.stat(path) {
            Ok(stat) => Ok(Some(stat)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LinkError::io("stat", path, e)),
        }
    }

    /// Bring one link into place.
    ///
    /// # Errors
    ///
    /// - any error from [`ConflictPolicy::handle`]
    /// - [`LinkError::InvariantViolation`] if the link path holds a device,
    ///   socket or fifo
    /// - [`LinkError::ConflictUnresolved`] if the path is still occupied
    ///   after [`MAX_RESOLUTIONS`] resolutions
    /// - [`LinkError::Io`] if inspection or symlink creation fails
    pub fn apply(&self, descriptor: &LinkDescriptor) -> Result<LinkOutcome, LinkError> {
        let mut resolutions = 0;
        loop {
            let state = self.inspect(descriptor)?;
            self.log.debug(&format!(
                "{}: {state:?}",
                descriptor.link_path.display()
            ));

            match state {
                DestState::Absent => return self.create(descriptor),
                DestState::Linked => return Ok(LinkOutcome::AlreadyCorrect),
                DestState::Other(kind) => {
                    return Err(LinkError::InvariantViolation {
                        path: descriptor.link_path.clone(),
                        kind: kind.to_string(),
                    });
                }
                DestState::ForeignSymlink | DestState::File | DestState::Directory => {
                    if state == DestState::ForeignSymlink {
                        self.log_foreign_target(&descriptor.link_path);
                    }
                    if resolutions == MAX_RESOLUTIONS {
                        return Err(LinkError::ConflictUnresolved {
                            path: descriptor.link_path.clone(),
                            attempts: resolutions,
                        });
                    }
                    resolutions += 1;

                    match self.policy.handle(
                        &descriptor.link_path,
                        self.fs,
                        self.log,
                        self.dry_run,
                    )? {
                        Resolution::Skip => {
                            return Ok(LinkOutcome::Skipped {
                                reason: "destination exists".to_string(),
                            });
                        }
                        // Nothing moved, so inspecting again would loop.
                        Resolution::Retry if self.dry_run => return self.create(descriptor),
                        Resolution::Retry => {}
                    }
                }
            }
        }
    }

    fn log_foreign_target(&self, link_path: &Path) {
        match self.fs.read_link(link_path) {
            Ok(current) => self.log.debug(&format!(
                "{} points to {}",
                link_path.display(),
                current.display()
            )),
            Err(e) => self.log.debug(&format!(
                "cannot read symlink {}: {e}",
                link_path.display()
            )),
        }
    }

    fn create(&self, descriptor: &LinkDescriptor) -> Result<LinkOutcome, LinkError> {
        if self.dry_run {
            self.log.dry_run(&format!("would link {descriptor}"));
            return Ok(LinkOutcome::Created);
        }

        if let Some(parent) = descriptor.link_path.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| LinkError::io("create_dir_all", parent, e))?;
        }
        self.fs
            .symlink(&descriptor.link_target, &descriptor.link_path)
            .map_err(|e| LinkError::io("symlink", &descriptor.link_path, e))?;
        self.log.info(&format!("linked {descriptor}"));
        Ok(LinkOutcome::Created)
    }

    /// Apply every descriptor in order, stopping at the first error.
    ///
    /// Links applied before a failure stay in place.  Each outcome is also
    /// recorded with the logger for the run summary.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`apply`](Self::apply).
    pub fn apply_all(&self, plan: &[LinkDescriptor]) -> Result<Report, LinkError> {
        let mut report = Report::default();
        for descriptor in plan {
            let outcome = self.apply(descriptor)?;
            self.log.record_link(self.entry_for(descriptor, &outcome));
            report.outcomes.push((descriptor.clone(), outcome));
        }
        Ok(report)
    }

    fn entry_for(&self, descriptor: &LinkDescriptor, outcome: &LinkOutcome) -> LinkEntry {
        let (status, message) = match outcome {
            LinkOutcome::Created if self.dry_run => (LinkStatus::DryRun, None),
            LinkOutcome::Created => (LinkStatus::Created, None),
            LinkOutcome::AlreadyCorrect => (LinkStatus::AlreadyCorrect, None),
            LinkOutcome::Skipped { reason } => (LinkStatus::Skipped, Some(reason.clone())),
        };
        LinkEntry {
            link: descriptor.link_path.clone(),
            target: descriptor.link_target.clone(),
            status,
            message,
        }
    }
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
    use crate::operations::{FileId, MockFileSystemOps, SystemFileSystemOps};
    use std::path::PathBuf;

    fn descriptor(source: &Path, dest_dir: &Path, prefix: &str) -> LinkDescriptor {
        LinkDescriptor::for_source(source, dest_dir, prefix).unwrap()
    }

    /// A temp "home" holding `.settings/<name>` files.
    fn home_with_sources(names: &[&str]) -> tempfile::TempDir {
        let home = tempfile::tempdir().unwrap();
        let settings = home.path().join(".settings");
        std::fs::create_dir(&settings).unwrap();
        for name in names {
            std::fs::write(settings.join(name), format!("# {name}")).unwrap();
        }
        home
    }

    fn bak_entries(dir: &Path, stem: &str) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(&format!("{stem}.bak_")))
            .collect()
    }

    fn stat_of(kind: FileKind) -> FileStat {
        FileStat {
            kind,
            id: FileId::Inode { dev: 1, ino: 9 },
        }
    }

    #[test]
    fn report_counts_outcomes() {
        let d = descriptor(Path::new("/h/s/a"), Path::new("/h"), ".");
        let report = Report {
            outcomes: vec![
                (d.clone(), LinkOutcome::Created),
                (d.clone(), LinkOutcome::Created),
                (d.clone(), LinkOutcome::AlreadyCorrect),
                (
                    d,
                    LinkOutcome::Skipped {
                        reason: "x".to_string(),
                    },
                ),
            ],
        };
        assert_eq!(report.created(), 2);
        assert_eq!(report.already_correct(), 1);
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn inspect_other_kinds() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|_| Ok(stat_of(FileKind::Socket)));
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&fs, &log, ConflictPolicy::Backup, false);
        let d = descriptor(Path::new("/h/s/sock"), Path::new("/h"), "");
        assert_eq!(
            applier.inspect(&d).unwrap(),
            DestState::Other(FileKind::Socket)
        );
    }

    #[test]
    fn inspect_surfaces_lstat_errors() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat()
            .returning(|_| Err(io::Error::from(io::ErrorKind::PermissionDenied)));
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&fs, &log, ConflictPolicy::Backup, false);
        let d = descriptor(Path::new("/h/s/a"), Path::new("/h"), "");
        assert!(matches!(
            applier.inspect(&d).unwrap_err(),
            LinkError::Io { op: "lstat", .. }
        ));
    }

    #[test]
    fn fifo_is_an_invariant_violation() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|_| Ok(stat_of(FileKind::Fifo)));
        fs.expect_symlink().never();
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&fs, &log, ConflictPolicy::Replace, false);
        let d = descriptor(Path::new("/h/s/pipe"), Path::new("/h"), "");
        match applier.apply(&d).unwrap_err() {
            LinkError::InvariantViolation { path, kind } => {
                assert_eq!(path, PathBuf::from("/h/pipe"));
                assert_eq!(kind, "fifo");
            }
            other => panic!("expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn stubborn_conflict_is_unresolved() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|p: &Path| {
            if p == Path::new("/h/.bashrc") {
                Ok(stat_of(FileKind::File))
            } else {
                Err(io::Error::from(io::ErrorKind::NotFound))
            }
        });
        fs.expect_rename()
            .times(usize::try_from(MAX_RESOLUTIONS).unwrap())
            .returning(|_, _| Ok(()));
        fs.expect_symlink().never();
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&fs, &log, ConflictPolicy::Backup, false);
        let d = descriptor(Path::new("/h/s/bashrc"), Path::new("/h"), ".");
        assert!(matches!(
            applier.apply(&d).unwrap_err(),
            LinkError::ConflictUnresolved { attempts, .. } if attempts == MAX_RESOLUTIONS
        ));
    }

    #[cfg(unix)]
    #[test]
    fn absent_destination_gets_relative_link() {
        let home = home_with_sources(&["bashrc"]);
        let source = home.path().join(".settings/bashrc");
        let d = descriptor(&source, home.path(), ".");
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Backup, false);

        assert_eq!(applier.apply(&d).unwrap(), LinkOutcome::Created);

        let link = home.path().join(".bashrc");
        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            PathBuf::from(".settings/bashrc")
        );
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "# bashrc");
    }

    #[cfg(unix)]
    #[test]
    fn second_run_is_already_correct() {
        let home = home_with_sources(&["zshrc"]);
        let d = descriptor(&home.path().join(".settings/zshrc"), home.path(), ".");
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Replace, false);

        assert_eq!(applier.apply(&d).unwrap(), LinkOutcome::Created);
        assert_eq!(applier.apply(&d).unwrap(), LinkOutcome::AlreadyCorrect);
    }

    #[cfg(unix)]
    #[test]
    fn absolute_link_to_source_is_already_correct() {
        let home = home_with_sources(&["vimrc"]);
        let source = home.path().join(".settings/vimrc");
        std::os::unix::fs::symlink(&source, home.path().join(".vimrc")).unwrap();
        let d = descriptor(&source, home.path(), ".");
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Fail, false);

        assert_eq!(applier.inspect(&d).unwrap(), DestState::Linked);
        assert_eq!(applier.apply(&d).unwrap(), LinkOutcome::AlreadyCorrect);
    }

    #[cfg(unix)]
    #[test]
    fn backup_leaves_one_backup_and_the_link() {
        let home = home_with_sources(&["bashrc"]);
        let link = home.path().join(".bashrc");
        std::fs::write(&link, "local edits").unwrap();
        let d = descriptor(&home.path().join(".settings/bashrc"), home.path(), ".");
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Backup, false);

        assert_eq!(applier.apply(&d).unwrap(), LinkOutcome::Created);

        let backups = bak_entries(home.path(), ".bashrc");
        assert_eq!(backups.len(), 1);
        assert_eq!(
            std::fs::read_to_string(home.path().join(&backups[0])).unwrap(),
            "local edits"
        );
        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            PathBuf::from(".settings/bashrc")
        );
    }

    #[cfg(unix)]
    #[test]
    fn replace_swaps_dangling_symlink() {
        let home = home_with_sources(&["gitconfig"]);
        let link = home.path().join(".gitconfig");
        std::os::unix::fs::symlink("/nonexistent/gitconfig", &link).unwrap();
        let d = descriptor(&home.path().join(".settings/gitconfig"), home.path(), ".");
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Replace, false);

        assert_eq!(applier.inspect(&d).unwrap(), DestState::ForeignSymlink);
        assert_eq!(applier.apply(&d).unwrap(), LinkOutcome::Created);
        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            PathBuf::from(".settings/gitconfig")
        );
    }

    #[cfg(unix)]
    #[test]
    fn unfollowable_symlinks_go_to_the_policy() {
        for policy in [ConflictPolicy::Replace, ConflictPolicy::Backup] {
            for target in [".bashrc", "plainfile/sub"] {
                let home = home_with_sources(&["bashrc"]);
                std::fs::write(home.path().join("plainfile"), "").unwrap();
                let link = home.path().join(".bashrc");
                std::os::unix::fs::symlink(target, &link).unwrap();
                let d = descriptor(&home.path().join(".settings/bashrc"), home.path(), ".");
                let log = MemoryLog::new();
                let applier = LinkApplier::new(&SystemFileSystemOps, &log, policy, false);

                assert_eq!(
                    applier.inspect(&d).unwrap(),
                    DestState::ForeignSymlink,
                    "{policy} with {target}"
                );
                assert_eq!(
                    applier.apply(&d).unwrap(),
                    LinkOutcome::Created,
                    "{policy} with {target}"
                );
                assert_eq!(
                    std::fs::read_link(&link).unwrap(),
                    PathBuf::from(".settings/bashrc")
                );
                let backups = bak_entries(home.path(), ".bashrc").len();
                assert_eq!(backups, usize::from(policy == ConflictPolicy::Backup));
            }
        }
    }

    #[test]
    fn source_stat_errors_still_surface() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_lstat().returning(|_| Ok(stat_of(FileKind::Symlink)));
        fs.expect_stat().returning(|p: &Path| {
            if p == Path::new("/h/.a") {
                Ok(stat_of(FileKind::File))
            } else {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            }
        });
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&fs, &log, ConflictPolicy::Backup, false);
        let d = descriptor(Path::new("/h/s/a"), Path::new("/h"), ".");
        assert!(matches!(
            applier.inspect(&d).unwrap_err(),
            LinkError::Io { op: "stat", ref path, .. } if path == Path::new("/h/s/a")
        ));
    }

    #[cfg(unix)]
    #[test]
    fn foreign_symlink_contents_are_logged() {
        let home = home_with_sources(&["tmux.conf"]);
        std::os::unix::fs::symlink("/etc/tmux.conf", home.path().join(".tmux.conf")).unwrap();
        let d = descriptor(&home.path().join(".settings/tmux.conf"), home.path(), ".");
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Warn, false);

        applier.apply(&d).unwrap();

        assert!(
            log.messages_at(LogLevel::Debug)
                .iter()
                .any(|m| m.ends_with(".tmux.conf points to /etc/tmux.conf"))
        );
    }

    #[test]
    fn applier_debug_output_names_policy() {
        let fs = MockFileSystemOps::new();
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&fs, &log, ConflictPolicy::Warn, true);
        let rendered = format!("{applier:?}");
        assert!(rendered.contains("Warn"));
        assert!(rendered.contains("dry_run: true"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_another_file_is_foreign() {
        let home = home_with_sources(&["inputrc", "other"]);
        std::os::unix::fs::symlink(".settings/other", home.path().join(".inputrc")).unwrap();
        let d = descriptor(&home.path().join(".settings/inputrc"), home.path(), ".");
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Warn, false);

        assert_eq!(applier.inspect(&d).unwrap(), DestState::ForeignSymlink);
        assert!(matches!(
            applier.apply(&d).unwrap(),
            LinkOutcome::Skipped { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn warn_leaves_file_untouched() {
        let home = home_with_sources(&["profile"]);
        let link = home.path().join(".profile");
        std::fs::write(&link, "mine").unwrap();
        let d = descriptor(&home.path().join(".settings/profile"), home.path(), ".");
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Warn, false);

        let outcome = applier.apply(&d).unwrap();

        assert_eq!(
            outcome,
            LinkOutcome::Skipped {
                reason: "destination exists".to_string()
            }
        );
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "mine");
        assert_eq!(log.messages_at(LogLevel::Warn).len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn replace_refuses_real_directory() {
        let home = home_with_sources(&["config"]);
        std::fs::create_dir(home.path().join(".config")).unwrap();
        let d = descriptor(&home.path().join(".settings/config"), home.path(), ".");
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Replace, false);

        assert!(matches!(
            applier.apply(&d).unwrap_err(),
            LinkError::DirectoryNotReplaced { .. }
        ));
        assert!(home.path().join(".config").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn fail_policy_aborts_batch_but_keeps_earlier_links() {
        let home = home_with_sources(&["aliases", "bashrc", "vimrc"]);
        std::fs::write(home.path().join(".bashrc"), "mine").unwrap();
        let plan: Vec<LinkDescriptor> = ["aliases", "bashrc", "vimrc"]
            .iter()
            .map(|n| descriptor(&home.path().join(".settings").join(n), home.path(), "."))
            .collect();
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Fail, false);

        let err = applier.apply_all(&plan).unwrap_err();

        assert!(matches!(err, LinkError::ConflictFailPolicy { .. }));
        assert!(home.path().join(".aliases").symlink_metadata().unwrap().is_symlink());
        assert_eq!(std::fs::read_to_string(home.path().join(".bashrc")).unwrap(), "mine");
        assert!(home.path().join(".vimrc").symlink_metadata().is_err());
        assert_eq!(log.links().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn dry_run_mutates_nothing() {
        let home = home_with_sources(&["bashrc", "zshrc"]);
        std::fs::write(home.path().join(".zshrc"), "mine").unwrap();
        let plan = vec![
            descriptor(&home.path().join(".settings/bashrc"), home.path(), "."),
            descriptor(&home.path().join(".settings/zshrc"), home.path(), "."),
        ];
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Backup, true);

        let report = applier.apply_all(&plan).unwrap();

        assert_eq!(report.created(), 2);
        assert!(home.path().join(".bashrc").symlink_metadata().is_err());
        assert_eq!(std::fs::read_to_string(home.path().join(".zshrc")).unwrap(), "mine");
        assert!(bak_entries(home.path(), ".zshrc").is_empty());

        let dry = log.messages_at(LogLevel::DryRun);
        assert_eq!(dry.len(), 3);
        assert!(dry[0].starts_with("would link "));
        assert!(dry[1].starts_with("would move "));
        assert!(dry[2].starts_with("would link "));
        assert!(log.links().iter().all(|e| e.status == LinkStatus::DryRun));
    }

    #[cfg(unix)]
    #[test]
    fn apply_all_records_each_outcome() {
        let home = home_with_sources(&["bashrc", "vimrc"]);
        std::fs::write(home.path().join(".vimrc"), "mine").unwrap();
        let plan = vec![
            descriptor(&home.path().join(".settings/bashrc"), home.path(), "."),
            descriptor(&home.path().join(".settings/vimrc"), home.path(), "."),
        ];
        let log = MemoryLog::new();
        let applier = LinkApplier::new(&SystemFileSystemOps, &log, ConflictPolicy::Warn, false);

        let report = applier.apply_all(&plan).unwrap();

        assert_eq!(report.created(), 1);
        assert_eq!(report.skipped(), 1);
        let statuses: Vec<LinkStatus> = log.links().iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![LinkStatus::Created, LinkStatus::Skipped]);
        assert_eq!(
            log.links()[1].message.as_deref(),
            Some("destination exists")
        );
    }
}
