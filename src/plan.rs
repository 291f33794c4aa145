//! Link planning: turn source paths into link descriptors.
//!
//! Planning never mutates the filesystem.  The only I/O it performs is the
//! one-time check that the destination is a directory, so a dry run can
//! print a plan that surfaces the same pre-flight errors a real run would.
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::LinkError;
use crate::operations::{FileKind, FileSystemOps};
use crate::paths::compute_link_target;

/// One symlink to install: where it goes and what it contains.
///
/// # Examples
///
/// ```
/// use dfi_cli::plan::LinkDescriptor;
/// use std::path::Path;
///
/// let d = LinkDescriptor::for_source(
///     Path::new("/home/x/.settings/bashrc"),
///     Path::new("/home/x"),
///     ".",
/// )
/// .unwrap();
/// assert_eq!(d.link_path, Path::new("/home/x/.bashrc"));
/// assert_eq!(d.link_target, Path::new(".settings/bashrc"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDescriptor {
    /// The real, versioned file or directory.
    pub source_path: PathBuf,
    /// Where the symlink must exist.
    pub link_path: PathBuf,
    /// The symlink contents; relative to `link_path`'s directory when possible.
    pub link_target: PathBuf,
}

impl LinkDescriptor {
    /// Compute the descriptor for a single absolute source path.
    ///
    /// The link is named `prefix` followed by the source's file name and
    /// placed directly in `dest_dir`.
    ///
    /// # Errors
    ///
    /// - [`LinkError::NoFileName`] if `source_path` has no final component
    /// - [`LinkError::LinkIsSource`] if the link would replace the source
    ///   itself (source already in `dest_dir`, no prefix)
    /// - [`LinkError::Path`] if the link target cannot be computed
    pub fn for_source(source_path: &Path, dest_dir: &Path, prefix: &str) -> Result<Self, LinkError> {
        let base = source_path
            .file_name()
            .ok_or_else(|| LinkError::NoFileName {
                path: source_path.to_path_buf(),
            })?;

        let mut name = OsString::from(prefix);
        name.push(base);
        let link_path = dest_dir.join(name);
        if link_path == source_path {
            return Err(LinkError::LinkIsSource { path: link_path });
        }
        let link_target = compute_link_target(source_path, &link_path)?;

        Ok(Self {
            source_path: source_path.to_path_buf(),
            link_path,
            link_target,
        })
    }

    /// File name the link will have in the destination directory.
    #[must_use]
    pub fn link_name(&self) -> String {
        self.link_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for LinkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.link_path.display(),
            self.link_target.display()
        )
    }
}

/// Builds link plans against an injected filesystem.
#[derive(Debug)]
pub struct PlanBuilder<'a> {
    fs: &'a dyn FileSystemOps,
}

impl<'a> PlanBuilder<'a> {
    /// Create a builder that checks the destination through `fs`.
    #[must_use]
    pub const fn new(fs: &'a dyn FileSystemOps) -> Self {
        Self { fs }
    }

    /// Compute one descriptor per source path, in input order.
    ///
    /// The same source listed twice yields a single descriptor.  Two distinct
    /// sources that would produce the same link name are rejected before
    /// anything is installed, since the second link would silently replace
    /// the first.
    ///
    /// # Errors
    ///
    /// - [`LinkError::NotADirectory`] if `dest_dir` is missing or not a directory
    /// - [`LinkError::DuplicateLinkName`] on a link name collision
    /// - [`LinkError::NoFileName`], [`LinkError::LinkIsSource`] or
    ///   [`LinkError::Path`] from descriptor computation
    /// - [`LinkError::Io`] if `dest_dir` cannot be inspected
    pub fn build(
        &self,
        source_paths: &[PathBuf],
        dest_dir: &Path,
        prefix: &str,
    ) -> Result<Vec<LinkDescriptor>, LinkError> {
        self.ensure_dest_dir(dest_dir)?;

        let mut plan: Vec<LinkDescriptor> = Vec::with_capacity(source_paths.len());
        let mut claimed: HashMap<OsString, PathBuf> = HashMap::new();

        for source in source_paths {
            let descriptor = LinkDescriptor::for_source(source, dest_dir, prefix)?;
            let name = descriptor
                .link_path
                .file_name()
                .map(OsStr::to_os_string)
                .unwrap_or_default();

            match claimed.get(&name) {
                Some(first) if first == source => continue,
                Some(first) => {
                    return Err(LinkError::DuplicateLinkName {
                        name: descriptor.link_name(),
                        first: first.clone(),
                        second: source.clone(),
                    });
                }
                None => {
                    claimed.insert(name, source.clone());
                    plan.push(descriptor);
                }
            }
        }

        Ok(plan)
    }

    fn ensure_dest_dir(&self, dest_dir: &Path) -> Result<(), LinkError> {
        match self.fs.stat(dest_dir) {
            Ok(stat) if stat.kind == FileKind::Dir => Ok(()),
            Ok(_) => Err(LinkError::NotADirectory {
                path: dest_dir.to_path_buf(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LinkError::NotADirectory {
                path: dest_dir.to_path_buf(),
            }),
            Err(e) => Err(LinkError::io("stat", dest_dir, e)),
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
    use crate::operations::{FileId, FileStat, MockFileSystemOps};
    use mockall::predicate::function;

    fn dir_stat() -> FileStat {
        FileStat {
            kind: FileKind::Dir,
            id: FileId::Inode { dev: 1, ino: 2 },
        }
    }

    /// A mock filesystem on which `dest` is a directory and nothing else is
    /// ever touched.
    fn fs_with_dest_dir(dest: &'static str) -> MockFileSystemOps {
        let mut fs = MockFileSystemOps::new();
        fs.expect_stat()
            .with(function(move |p: &Path| p == Path::new(dest)))
            .times(1)
            .returning(|_| Ok(dir_stat()));
        fs
    }

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn descriptor_for_dotfile() {
        let d =
            LinkDescriptor::for_source(Path::new("/home/x/.settings/bashrc"), Path::new("/home/x"), ".")
                .unwrap();
        assert_eq!(
            d,
            LinkDescriptor {
                source_path: PathBuf::from("/home/x/.settings/bashrc"),
                link_path: PathBuf::from("/home/x/.bashrc"),
                link_target: PathBuf::from(".settings/bashrc"),
            }
        );
    }

    #[test]
    fn descriptor_for_bin_file() {
        let d = LinkDescriptor::for_source(
            Path::new("/home/x/.settings/bin/foo"),
            Path::new("/home/x/.local/bin"),
            "",
        )
        .unwrap();
        assert_eq!(d.link_path, PathBuf::from("/home/x/.local/bin/foo"));
        assert_eq!(d.link_target, PathBuf::from("../../.settings/bin/foo"));
    }

    #[test]
    fn descriptor_without_common_root_is_absolute() {
        let d = LinkDescriptor::for_source(
            Path::new("/home/x/.settings/bin/foo"),
            Path::new("/path/to/blah"),
            "",
        )
        .unwrap();
        assert_eq!(d.link_path, PathBuf::from("/path/to/blah/foo"));
        assert_eq!(d.link_target, PathBuf::from("/home/x/.settings/bin/foo"));
    }

    #[test]
    fn descriptor_rejects_root_source() {
        let err = LinkDescriptor::for_source(Path::new("/"), Path::new("/home/x"), ".").unwrap_err();
        assert!(matches!(err, LinkError::NoFileName { .. }));
    }

    #[test]
    fn descriptor_display() {
        let d =
            LinkDescriptor::for_source(Path::new("/home/x/.settings/vimrc"), Path::new("/home/x"), ".")
                .unwrap();
        assert_eq!(d.to_string(), "/home/x/.vimrc -> .settings/vimrc");
    }

    #[test]
    fn build_preserves_input_order() {
        let fs = fs_with_dest_dir("/home/x");
        let plan = PlanBuilder::new(&fs)
            .build(
                &paths(&["/home/x/s/zshrc", "/home/x/s/bashrc", "/home/x/s/vimrc"]),
                Path::new("/home/x"),
                ".",
            )
            .unwrap();
        let names: Vec<String> = plan.iter().map(LinkDescriptor::link_name).collect();
        assert_eq!(names, vec![".zshrc", ".bashrc", ".vimrc"]);
    }

    #[test]
    fn build_rejects_duplicate_link_names() {
        let fs = fs_with_dest_dir("/home/x");
        let err = PlanBuilder::new(&fs)
            .build(
                &paths(&["/home/x/a/bashrc", "/home/x/b/bashrc"]),
                Path::new("/home/x"),
                ".",
            )
            .unwrap_err();
        match err {
            LinkError::DuplicateLinkName {
                name,
                first,
                second,
            } => {
                assert_eq!(name, ".bashrc");
                assert_eq!(first, PathBuf::from("/home/x/a/bashrc"));
                assert_eq!(second, PathBuf::from("/home/x/b/bashrc"));
            }
            other => panic!("expected DuplicateLinkName, got {other:?}"),
        }
    }

    #[test]
    fn build_collapses_repeated_source() {
        let fs = fs_with_dest_dir("/home/x");
        let plan = PlanBuilder::new(&fs)
            .build(
                &paths(&["/home/x/s/bashrc", "/home/x/s/bashrc"]),
                Path::new("/home/x"),
                ".",
            )
            .unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn names_differing_in_invalid_bytes_do_not_collide() {
        use std::os::unix::ffi::OsStrExt as _;
        let sources = vec![
            Path::new("/s").join(OsStr::from_bytes(b"a\xff")),
            Path::new("/s").join(OsStr::from_bytes(b"a\xfe")),
        ];
        let fs = fs_with_dest_dir("/h");
        let plan = PlanBuilder::new(&fs)
            .build(&sources, Path::new("/h"), "")
            .unwrap();
        assert_eq!(plan.len(), 2);
        assert_ne!(plan[0].link_path, plan[1].link_path);
    }

    #[test]
    fn source_inside_dest_without_prefix_is_rejected() {
        let fs = fs_with_dest_dir("/home/x");
        let err = PlanBuilder::new(&fs)
            .build(&paths(&["/home/x/bashrc"]), Path::new("/home/x"), "")
            .unwrap_err();
        assert!(matches!(
            err,
            LinkError::LinkIsSource { ref path } if path == Path::new("/home/x/bashrc")
        ));
    }

    #[test]
    fn source_inside_dest_with_prefix_is_fine() {
        let d = LinkDescriptor::for_source(Path::new("/home/x/bashrc"), Path::new("/home/x"), ".")
            .unwrap();
        assert_eq!(d.link_path, PathBuf::from("/home/x/.bashrc"));
        assert_eq!(d.link_target, PathBuf::from("bashrc"));
    }

    #[test]
    fn build_fails_when_dest_missing() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_stat()
            .returning(|_| Err(std::io::Error::from(std::io::ErrorKind::NotFound)));
        let err = PlanBuilder::new(&fs)
            .build(&paths(&["/s/bashrc"]), Path::new("/missing"), ".")
            .unwrap_err();
        assert!(matches!(err, LinkError::NotADirectory { .. }));
    }

    #[test]
    fn build_fails_when_dest_is_file() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_stat().returning(|_| {
            Ok(FileStat {
                kind: FileKind::File,
                id: FileId::Inode { dev: 1, ino: 3 },
            })
        });
        let err = PlanBuilder::new(&fs)
            .build(&paths(&["/s/bashrc"]), Path::new("/home/x/.profile"), ".")
            .unwrap_err();
        assert!(matches!(err, LinkError::NotADirectory { .. }));
    }

    #[test]
    fn build_surfaces_other_stat_errors() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_stat()
            .returning(|_| Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied)));
        let err = PlanBuilder::new(&fs)
            .build(&paths(&["/s/bashrc"]), Path::new("/root"), ".")
            .unwrap_err();
        assert!(matches!(err, LinkError::Io { op: "stat", .. }));
    }

    #[test]
    fn rendered_plan_snapshot() {
        let fs = fs_with_dest_dir("/home/x/.local/bin");
        let plan = PlanBuilder::new(&fs)
            .build(
                &paths(&[
                    "/home/x/.settings/bin/ls",
                    "/home/x/.settings/bin/cat",
                    "/opt/tools/dog",
                ]),
                Path::new("/home/x/.local/bin"),
                "",
            )
            .unwrap();
        let rendered: Vec<String> = plan.iter().map(ToString::to_string).collect();
        insta::assert_snapshot!(rendered.join("\n"), @r"
        /home/x/.local/bin/ls -> ../../.settings/bin/ls
        /home/x/.local/bin/cat -> ../../.settings/bin/cat
        /home/x/.local/bin/dog -> /opt/tools/dog
        ");
    }
}
