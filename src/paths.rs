//! Pure path arithmetic: common ancestors, lexical normalisation, relative
//! paths and file-name wildcards.
//!
//! Nothing in here touches the filesystem except [`absolutize`], which reads
//! the current directory.  Callers are expected to pass clean absolute paths;
//! [`common_ancestor_dir`] deliberately works on raw bytes and does not
//! interpret `.` or `..`.
use std::path::{Component, Path, PathBuf};

use crate::error::LinkError;

/// The separator byte [`common_ancestor_dir`] scans for.
const SLASH: u8 = b'/';

/// Return the longest directory prefix shared by `a` and `b`.
///
/// Scans both paths byte by byte and stops at the first difference; the
/// result ends at the last `/` seen before that point.  A prefix consisting
/// of only the root `/` does not count, so paths whose first component
/// differs have no common ancestor and `None` is returned.
///
/// # Examples
///
/// ```
/// use dfi_cli::paths::common_ancestor_dir;
/// use std::path::Path;
///
/// let common = common_ancestor_dir(Path::new("/a/b/c/d"), Path::new("/a/b/c"));
/// assert_eq!(common, Some(Path::new("/a/b")));
/// assert_eq!(common_ancestor_dir(Path::new("/qwer"), Path::new("/a/b/c")), None);
/// ```
#[must_use]
pub fn common_ancestor_dir<'a>(a: &'a Path, b: &Path) -> Option<&'a Path> {
    let a_bytes = a.as_os_str().as_encoded_bytes();
    let b_bytes = b.as_os_str().as_encoded_bytes();

    let mut last_slash = 0;
    for (i, (x, y)) in a_bytes.iter().zip(b_bytes).enumerate() {
        if x != y {
            break;
        }
        if *x == SLASH {
            last_slash = i;
        }
    }

    if last_slash == 0 {
        return None;
    }
    a.ancestors()
        .find(|p| p.as_os_str().as_encoded_bytes().len() == last_slash)
}

/// Compute the symlink contents that make `link_path` point at `source_path`.
///
/// When the two paths share a directory, the result is relative to the
/// directory containing `link_path`, so the link keeps working when the
/// source tree and the destination move together.  Otherwise the absolute
/// `source_path` is returned unchanged.
///
/// # Errors
///
/// Returns [`LinkError::Path`] if one path cannot be expressed relative to
/// the other.
pub fn compute_link_target(source_path: &Path, link_path: &Path) -> Result<PathBuf, LinkError> {
    let Some(common) = common_ancestor_dir(source_path, link_path) else {
        return Ok(source_path.to_path_buf());
    };

    let link_dir = link_path.parent().ok_or_else(|| LinkError::Path {
        base: link_path.to_path_buf(),
        target: source_path.to_path_buf(),
    })?;

    let rel_base = relative(link_dir, common)?;
    let rel_source = relative(common, source_path)?;
    Ok(normalize(&rel_base.join(rel_source)))
}

/// Express `target` relative to the directory `base`, lexically.
///
/// Both paths must be absolute, or both relative.  Returns `.` when they are
/// equal.
///
/// # Errors
///
/// Returns [`LinkError::Path`] when the paths mix absolute and relative
/// forms, or when `base` climbs above what `target` shares with it.
pub fn relative(base: &Path, target: &Path) -> Result<PathBuf, LinkError> {
    let err = || LinkError::Path {
        base: base.to_path_buf(),
        target: target.to_path_buf(),
    };

    if base.is_absolute() != target.is_absolute() {
        return Err(err());
    }

    let base_clean = normalize(base);
    let target_clean = normalize(target);
    let base_parts: Vec<Component<'_>> = base_clean.components().collect();
    let target_parts: Vec<Component<'_>> = target_clean.components().collect();

    let shared = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(b, t)| b == t)
        .count();

    let mut out = PathBuf::new();
    for part in base_parts.iter().skip(shared) {
        match part {
            Component::Normal(_) => out.push(".."),
            Component::CurDir => {}
            _ => return Err(err()),
        }
    }
    for part in target_parts.iter().skip(shared) {
        out.push(part.as_os_str());
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    Ok(out)
}

/// Lexically clean `path`: drop `.` components and fold `..` into the
/// preceding component.  `..` never climbs above the root.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Make `path` absolute against the current directory and normalise it.
///
/// Symlinks along the way are not resolved: the link plan must point at the
/// path the user named, not at whatever it currently resolves to.
///
/// # Errors
///
/// Returns an error if the current directory cannot be read or `path` is
/// empty.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    std::path::absolute(path).map(|p| normalize(&p))
}

/// Returns `true` if `name` contains a wildcard character (`*` or `?`).
#[must_use]
pub fn has_wildcard(name: &str) -> bool {
    name.contains(['*', '?'])
}

/// Match a single file name against a shell-style wildcard pattern.
///
/// `*` matches any run of characters and `?` exactly one.  As in a shell, a
/// leading `.` in `name` must be matched literally, so `*` does not pick up
/// dotfiles.
#[must_use]
pub fn matches_wildcard(pattern: &str, name: &str) -> bool {
    if name.starts_with('.') && !pattern.starts_with('.') {
        return false;
    }

    let pat: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = name.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while let Some(&c) = text.get(ti) {
        match pat.get(pi) {
            Some('*') => {
                backtrack = Some((pi, ti));
                pi += 1;
            }
            Some(&p) if p == '?' || p == c => {
                pi += 1;
                ti += 1;
            }
            _ => match backtrack {
                Some((star, resume)) => {
                    pi = star + 1;
                    ti = resume + 1;
                    backtrack = Some((star, resume + 1));
                }
                None => return false,
            },
        }
    }
    pat.iter().skip(pi).all(|&p| p == '*')
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn common(a: &str, b: &str) -> String {
        common_ancestor_dir(Path::new(a), Path::new(b))
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    /// Resolve `target` the way the kernel would for a link at `link`.
    fn resolve(link: &Path, target: &Path) -> PathBuf {
        normalize(&link.parent().unwrap().join(target))
    }

    // -----------------------------------------------------------------------
    // common_ancestor_dir
    // -----------------------------------------------------------------------

    #[test]
    fn common_ancestor_of_diverging_paths() {
        assert_eq!(common("/a/b/c/d/e/f", "/a/b/c/d/q/e/r"), "/a/b/c/d");
    }

    #[test]
    fn common_ancestor_stops_at_last_shared_slash() {
        assert_eq!(common("/a/b/c/d", "/a/b/c"), "/a/b");
    }

    #[test]
    fn common_ancestor_root_only_is_none() {
        assert_eq!(common("/", "/a/b/c"), "");
        assert_eq!(common("/qwer", "/a/b/c"), "");
    }

    #[test]
    fn common_ancestor_splits_on_partial_component() {
        assert_eq!(common("/home/x/.settings/bashrc", "/home/x/.bashrc"), "/home/x");
    }

    #[test]
    fn common_ancestor_none_for_relative_mismatch() {
        assert_eq!(common("abc/d", "xyz/d"), "");
    }

    // -----------------------------------------------------------------------
    // relative / normalize
    // -----------------------------------------------------------------------

    #[test]
    fn relative_to_self_is_dot() {
        let rel = relative(Path::new("/home/x"), Path::new("/home/x")).unwrap();
        assert_eq!(rel, PathBuf::from("."));
    }

    #[test]
    fn relative_climbs_out_of_base() {
        let rel = relative(Path::new("/home/x/.local/bin"), Path::new("/home/x")).unwrap();
        assert_eq!(rel, PathBuf::from("../.."));
    }

    #[test]
    fn relative_descends_into_target() {
        let rel = relative(Path::new("/home/x"), Path::new("/home/x/.settings/bashrc")).unwrap();
        assert_eq!(rel, PathBuf::from(".settings/bashrc"));
    }

    #[test]
    fn relative_rejects_mixed_forms() {
        let err = relative(Path::new("/home/x"), Path::new("x/y")).unwrap_err();
        assert!(matches!(err, LinkError::Path { .. }));
    }

    #[test]
    fn relative_rejects_unresolvable_parent() {
        let err = relative(Path::new("../a"), Path::new("b")).unwrap_err();
        assert!(matches!(err, LinkError::Path { .. }));
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("./x")), PathBuf::from("x"));
        assert_eq!(normalize(Path::new("../../x")), PathBuf::from("../../x"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("")), PathBuf::from("."));
    }

    #[test]
    fn absolutize_keeps_absolute_paths() {
        let abs = absolutize(Path::new("/tmp/./a/../b")).unwrap();
        assert_eq!(abs, PathBuf::from("/tmp/b"));
    }

    #[test]
    fn absolutize_joins_relative_paths_onto_cwd() {
        let abs = absolutize(Path::new("some/file")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("some/file"));
    }

    // -----------------------------------------------------------------------
    // compute_link_target
    // -----------------------------------------------------------------------

    #[test]
    fn link_target_sibling_of_settings_dir() {
        let target = compute_link_target(
            Path::new("/home/x/.settings/bashrc"),
            Path::new("/home/x/.bashrc"),
        )
        .unwrap();
        assert_eq!(target, PathBuf::from(".settings/bashrc"));
    }

    #[test]
    fn link_target_climbs_out_of_nested_dest() {
        let target = compute_link_target(
            Path::new("/home/x/.settings/bin/foo"),
            Path::new("/home/x/.local/bin/foo"),
        )
        .unwrap();
        assert_eq!(target, PathBuf::from("../../.settings/bin/foo"));
    }

    #[test]
    fn link_target_falls_back_to_absolute() {
        let target = compute_link_target(
            Path::new("/home/x/.settings/bin/foo"),
            Path::new("/path/to/blah/foo"),
        )
        .unwrap();
        assert_eq!(target, PathBuf::from("/home/x/.settings/bin/foo"));
    }

    #[test]
    fn link_target_resolves_back_to_source() {
        let pairs = [
            ("/home/x/.settings/bashrc", "/home/x/.bashrc"),
            ("/home/x/.settings/bin/foo", "/home/x/.local/bin/foo"),
            ("/a/b/c/d/e/f", "/a/b/c/d/q/e/r"),
            ("/a/b/c", "/a/b/c.link"),
            ("/srv/dots/vim/vimrc", "/srv/dots.d/out/vimrc"),
            ("/a/x", "/a/b/c/d/x"),
            ("/home/x/.settings/bin/foo", "/path/to/blah/foo"),
        ];
        for (source, link) in pairs {
            let source = Path::new(source);
            let link = Path::new(link);
            let target = compute_link_target(source, link).unwrap();
            assert_eq!(
                resolve(link, &target),
                source,
                "{} -> {} does not resolve back",
                link.display(),
                target.display()
            );
        }
    }

    // -----------------------------------------------------------------------
    // wildcards
    // -----------------------------------------------------------------------

    #[test]
    fn wildcard_detection() {
        assert!(has_wildcard("*.conf"));
        assert!(has_wildcard("file?"));
        assert!(!has_wildcard("bashrc"));
    }

    #[test]
    fn wildcard_star_and_question_mark() {
        assert!(matches_wildcard("*", "bashrc"));
        assert!(matches_wildcard("*rc", "bashrc"));
        assert!(matches_wildcard("b?shrc", "bashrc"));
        assert!(matches_wildcard("*sh*", "bashrc"));
        assert!(!matches_wildcard("*.conf", "bashrc"));
        assert!(!matches_wildcard("b?rc", "bashrc"));
    }

    #[test]
    fn wildcard_skips_dotfiles_unless_pattern_has_dot() {
        assert!(!matches_wildcard("*", ".hidden"));
        assert!(matches_wildcard(".*", ".hidden"));
    }
}
