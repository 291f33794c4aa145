//! Collecting source paths: stdin lists and wildcard expansion.
//!
//! Sources come from the command line.  A source of `-` stands for a list
//! read from stdin, and a source whose file name contains `*` or `?` is
//! expanded against its parent directory.
use std::ffi::OsStr;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::operations::FileSystemOps;
use crate::paths::has_wildcard;

/// The source argument that means "read the list from stdin".
pub const STDIN_MARKER: &str = "-";

/// How entries are separated in a source list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    /// One path per line; a trailing `\r` is dropped.
    #[default]
    Newline,
    /// NUL-separated, as produced by `find -print0`.
    Nul,
}

impl Separator {
    const fn byte(self) -> u8 {
        match self {
            Self::Newline => b'\n',
            Self::Nul => 0,
        }
    }
}

/// Read a list of source paths from `reader`.
///
/// A trailing separator is optional and empty entries are dropped.
///
/// # Errors
///
/// Returns [`SourceError::Read`] if the reader fails.
pub fn read_sources<R: BufRead>(reader: R, separator: Separator) -> Result<Vec<PathBuf>, SourceError> {
    let mut sources = Vec::new();
    for chunk in reader.split(separator.byte()) {
        let mut entry = chunk.map_err(SourceError::Read)?;
        if separator == Separator::Newline && entry.last() == Some(&b'\r') {
            entry.pop();
        }
        if !entry.is_empty() {
            sources.push(path_from_bytes(entry));
        }
    }
    Ok(sources)
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt as _;
    PathBuf::from(std::ffi::OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}

/// Expand the source arguments into concrete paths, in order.
///
/// `-` is replaced by the entries read from `stdin` (only the first `-`
/// reads; later ones contribute nothing).  Wildcards are expanded only in
/// the final path component, with matches in sorted order.  Entries read
/// from stdin are taken literally.
///
/// # Errors
///
/// - [`SourceError::Read`] if stdin cannot be read
/// - [`SourceError::NoMatches`] if a wildcard matches nothing
/// - [`SourceError::Io`] if a wildcard's directory cannot be listed
pub fn collect<R: BufRead>(
    args: &[PathBuf],
    stdin: R,
    separator: Separator,
    fs: &dyn FileSystemOps,
) -> Result<Vec<PathBuf>, SourceError> {
    let mut stdin = Some(stdin);
    let mut sources = Vec::with_capacity(args.len());

    for arg in args {
        if arg.as_os_str() == OsStr::new(STDIN_MARKER) {
            if let Some(reader) = stdin.take() {
                sources.extend(read_sources(reader, separator)?);
            }
            continue;
        }

        match wildcard_parts(arg) {
            Some((dir, pattern)) => sources.extend(expand(fs, arg, dir, pattern)?),
            None => sources.push(arg.clone()),
        }
    }

    Ok(sources)
}

/// Split `arg` into `(directory, pattern)` if its file name is a wildcard.
fn wildcard_parts(arg: &Path) -> Option<(&Path, &str)> {
    let pattern = arg.file_name()?.to_str()?;
    if !has_wildcard(pattern) {
        return None;
    }
    let dir = match arg.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Some((dir, pattern))
}

fn expand(
    fs: &dyn FileSystemOps,
    arg: &Path,
    dir: &Path,
    pattern: &str,
) -> Result<Vec<PathBuf>, SourceError> {
    let matches = fs.glob(dir, pattern).map_err(|source| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    if matches.is_empty() {
        return Err(SourceError::NoMatches {
            pattern: arg.to_path_buf(),
        });
    }
    Ok(matches)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::operations::{MockFileSystemOps, SystemFileSystemOps};
    use std::io::{self, Cursor};

    fn read(input: &[u8], separator: Separator) -> Vec<PathBuf> {
        read_sources(Cursor::new(input.to_vec()), separator).unwrap()
    }

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn newline_with_trailing_separator() {
        assert_eq!(read(b"a\nb\nc\n", Separator::Newline), paths(&["a", "b", "c"]));
    }

    #[test]
    fn newline_without_trailing_separator() {
        assert_eq!(read(b"a\nb\nc", Separator::Newline), paths(&["a", "b", "c"]));
    }

    #[test]
    fn newline_tolerates_crlf() {
        assert_eq!(read(b"a\r\nb\r\n", Separator::Newline), paths(&["a", "b"]));
    }

    #[test]
    fn nul_with_and_without_trailing_separator() {
        assert_eq!(read(b"a\0b\0c\0", Separator::Nul), paths(&["a", "b", "c"]));
        assert_eq!(read(b"a\0b\0c", Separator::Nul), paths(&["a", "b", "c"]));
    }

    #[test]
    fn nul_keeps_newlines_inside_names() {
        assert_eq!(
            read(b"odd\nname\0plain\0", Separator::Nul),
            paths(&["odd\nname", "plain"])
        );
    }

    #[test]
    fn empty_entries_are_dropped() {
        assert_eq!(read(b"\na\n\n\nb\n", Separator::Newline), paths(&["a", "b"]));
        assert!(read(b"", Separator::Newline).is_empty());
    }

    #[test]
    fn collect_passes_plain_paths_through() {
        let fs = MockFileSystemOps::new();
        let got = collect(
            &paths(&["/s/bashrc", "/s/zshrc"]),
            io::empty(),
            Separator::Newline,
            &fs,
        )
        .unwrap();
        assert_eq!(got, paths(&["/s/bashrc", "/s/zshrc"]));
    }

    #[test]
    fn collect_splices_stdin_in_place() {
        let fs = MockFileSystemOps::new();
        let got = collect(
            &paths(&["/s/first", "-", "/s/last"]),
            Cursor::new(b"/s/x\n/s/y\n".to_vec()),
            Separator::Newline,
            &fs,
        )
        .unwrap();
        assert_eq!(got, paths(&["/s/first", "/s/x", "/s/y", "/s/last"]));
    }

    #[test]
    fn collect_reads_stdin_once() {
        let fs = MockFileSystemOps::new();
        let got = collect(
            &paths(&["-", "-"]),
            Cursor::new(b"/s/x\0".to_vec()),
            Separator::Nul,
            &fs,
        )
        .unwrap();
        assert_eq!(got, paths(&["/s/x"]));
    }

    #[test]
    fn collect_expands_wildcards_in_file_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["bashrc", "zshrc", "notes.md"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let got = collect(
            &[dir.path().join("*rc")],
            io::empty(),
            Separator::Newline,
            &SystemFileSystemOps,
        )
        .unwrap();
        assert_eq!(got, vec![dir.path().join("bashrc"), dir.path().join("zshrc")]);
    }

    #[test]
    fn collect_relative_wildcard_lists_current_dir() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_glob()
            .withf(|dir: &Path, pattern: &str| dir == Path::new(".") && pattern == "*.conf")
            .times(1)
            .returning(|_, _| Ok(vec![PathBuf::from("./a.conf")]));
        let got = collect(
            &paths(&["*.conf"]),
            io::empty(),
            Separator::Newline,
            &fs,
        )
        .unwrap();
        assert_eq!(got, paths(&["./a.conf"]));
    }

    #[test]
    fn collect_fails_on_unmatched_wildcard() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_glob().returning(|_, _| Ok(Vec::new()));
        let err = collect(
            &paths(&["/s/*.nope"]),
            io::empty(),
            Separator::Newline,
            &fs,
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::NoMatches { ref pattern } if pattern == Path::new("/s/*.nope")));
    }

    #[test]
    fn collect_surfaces_listing_errors() {
        let mut fs = MockFileSystemOps::new();
        fs.expect_glob()
            .returning(|_, _| Err(io::Error::from(io::ErrorKind::NotFound)));
        let err = collect(
            &paths(&["/missing/*"]),
            io::empty(),
            Separator::Newline,
            &fs,
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::Io { ref path, .. } if path == Path::new("/missing")));
    }
}
