//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that the plan builder and the
//! link applier can be unit-tested without touching the real filesystem.
//! Production code uses [`SystemFileSystemOps`]; unit tests use the
//! `mockall`-generated `MockFileSystemOps`.
//!
//! Every method reports failures as [`std::io::Error`];
//! [`ErrorKind::NotFound`](std::io::ErrorKind::NotFound) is how callers tell
//! "nothing there" apart from real failures.
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::paths::matches_wildcard;

/// The kind of a filesystem entry, as seen by `lstat` or `stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A symbolic link (only reported by [`FileSystemOps::lstat`]).
    Symlink,
    /// A regular file.
    File,
    /// A directory.
    Dir,
    /// A named pipe.
    Fifo,
    /// A socket.
    Socket,
    /// A block device.
    BlockDevice,
    /// A character device.
    CharDevice,
    /// Anything the platform reports that is none of the above.
    Unknown,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Symlink => "symlink",
            Self::File => "file",
            Self::Dir => "directory",
            Self::Fifo => "fifo",
            Self::Socket => "socket",
            Self::BlockDevice => "block device",
            Self::CharDevice => "character device",
            Self::Unknown => "unknown file type",
        };
        f.write_str(name)
    }
}

/// Identity of the underlying file, used by [`FileSystemOps::same_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileId {
    /// Device and inode number.
    Inode {
        /// Device the file lives on.
        dev: u64,
        /// Inode number on that device.
        ino: u64,
    },
    /// Canonical path, on platforms without inode numbers.
    Canonical(PathBuf),
}

/// The subset of file metadata the link engine cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    /// What kind of entry this is.
    pub kind: FileKind,
    /// Identity of the file.
    pub id: FileId,
}

/// Abstraction over the filesystem primitives used to plan and apply links.
///
/// Implement this trait to swap in a mock during unit tests, keeping the
/// link logic independent of real I/O.  The production implementation is
/// [`SystemFileSystemOps`].
#[cfg_attr(test, mockall::automock)]
pub trait FileSystemOps: fmt::Debug {
    /// Inspect `path` without following a final symlink.
    ///
    /// # Errors
    ///
    /// Returns an error (`NotFound` if absent) if `path` cannot be inspected.
    fn lstat(&self, path: &Path) -> io::Result<FileStat>;

    /// Inspect `path`, following symlinks.
    ///
    /// # Errors
    ///
    /// Returns an error (`NotFound` if absent or dangling) if `path` cannot be
    /// inspected.
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// Create a symlink at `link` whose contents are `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Rename `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove the file or symlink at `path`.  Never removes directories.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails or `path` is a directory.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Create `path` and any missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Read the contents of the symlink at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a symlink or cannot be read.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Return the entries of `dir` whose file name matches the wildcard
    /// `pattern`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be listed.
    fn glob(&self, dir: &Path, pattern: &str) -> io::Result<Vec<PathBuf>>;

    /// Returns `true` if both stats describe the same underlying file.
    fn same_file(&self, a: &FileStat, b: &FileStat) -> bool {
        a.id == b.id
    }
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl SystemFileSystemOps {
    fn to_stat(path: &Path, meta: &std::fs::Metadata) -> io::Result<FileStat> {
        Ok(FileStat {
            kind: kind_of(&meta.file_type()),
            id: file_id(path, meta)?,
        })
    }
}

impl FileSystemOps for SystemFileSystemOps {
    fn lstat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = std::fs::symlink_metadata(path)?;
        Self::to_stat(path, &meta)
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = std::fs::metadata(path)?;
        Self::to_stat(path, &meta)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        create_symlink(target, link)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let meta = std::fs::symlink_metadata(path)?;
        if meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("refusing to remove directory {}", path.display()),
            ));
        }
        let result = std::fs::remove_file(path);
        // Directory symlinks on Windows are removed like directories.
        #[cfg(windows)]
        if result.is_err() && meta.is_symlink() {
            return std::fs::remove_dir(path);
        }
        result
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn glob(&self, dir: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let mut matches = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if matches_wildcard(pattern, &entry.file_name().to_string_lossy()) {
                matches.push(entry.path());
            }
        }
        matches.sort();
        Ok(matches)
    }
}

#[cfg(unix)]
fn kind_of(ft: &std::fs::FileType) -> FileKind {
    use std::os::unix::fs::FileTypeExt as _;
    if ft.is_symlink() {
        FileKind::Symlink
    } else if ft.is_file() {
        FileKind::File
    } else if ft.is_dir() {
        FileKind::Dir
    } else if ft.is_fifo() {
        FileKind::Fifo
    } else if ft.is_socket() {
        FileKind::Socket
    } else if ft.is_block_device() {
        FileKind::BlockDevice
    } else if ft.is_char_device() {
        FileKind::CharDevice
    } else {
        FileKind::Unknown
    }
}

#[cfg(not(unix))]
fn kind_of(ft: &std::fs::FileType) -> FileKind {
    if ft.is_symlink() {
        FileKind::Symlink
    } else if ft.is_file() {
        FileKind::File
    } else if ft.is_dir() {
        FileKind::Dir
    } else {
        FileKind::Unknown
    }
}

#[cfg(unix)]
#[allow(clippy::unnecessary_wraps)]
fn file_id(_path: &Path, meta: &std::fs::Metadata) -> io::Result<FileId> {
    use std::os::unix::fs::MetadataExt as _;
    Ok(FileId::Inode {
        dev: meta.dev(),
        ino: meta.ino(),
    })
}

#[cfg(not(unix))]
fn file_id(path: &Path, meta: &std::fs::Metadata) -> io::Result<FileId> {
    // A symlink's own identity is its path; anything else is identified by
    // where it canonically lives.
    if meta.file_type().is_symlink() {
        return Ok(FileId::Canonical(path.to_path_buf()));
    }
    std::fs::canonicalize(path).map(FileId::Canonical)
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    {
        // Relative targets are resolved against the link's directory.
        let resolved = link
            .parent()
            .map_or_else(|| target.to_path_buf(), |dir| dir.join(target));
        if resolved.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        }
    }
}
