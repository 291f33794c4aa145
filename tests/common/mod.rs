// Shared helpers for integration tests.
//
// Provides a temporary home directory laid out like a real dotfiles checkout
// and a fluent builder so each integration test can set up an isolated
// environment without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use dfi_cli::conflict::ConflictPolicy;
use dfi_cli::settings::Settings;

/// Dotfiles created under `.settings/dotfiles/`.
pub const DOTFILES: &[&str] = &["bashrc", "vimrc", "zshrc"];

/// Executables created under `.settings/bin/`.
pub const BIN_FILES: &[&str] = &["cat", "dog", "ls"];

/// Write the fixture tree into `home`.
///
/// Creates:
/// - `.settings/dotfiles/{bashrc,vimrc,zshrc}`
/// - `.settings/bin/{cat,dog,ls}`
/// - `.local/bin/` (empty link destination)
pub fn setup_home(home: &Path) {
    let dotfiles = home.join(".settings/dotfiles");
    let bin = home.join(".settings/bin");
    std::fs::create_dir_all(&dotfiles).expect("create dotfiles dir");
    std::fs::create_dir_all(&bin).expect("create bin dir");
    std::fs::create_dir_all(home.join(".local/bin")).expect("create .local/bin");

    for name in DOTFILES {
        std::fs::write(dotfiles.join(name), format!("# {name}\n")).expect("write dotfile");
    }
    for name in BIN_FILES {
        std::fs::write(bin.join(name), format!("#!/bin/sh\n# {name}\n")).expect("write bin file");
    }
}

/// An isolated home directory backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct IntegrationTestContext {
    /// Temporary directory standing in for `$HOME`.
    pub home: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create a new context with the fixture tree in place.
    pub fn new() -> Self {
        let home = tempfile::tempdir().expect("create temp dir");
        setup_home(home.path());
        Self { home }
    }

    /// Path to the temporary home.
    pub fn home_path(&self) -> &Path {
        self.home.path()
    }

    /// Absolute paths of every dotfile source.
    pub fn dotfile_sources(&self) -> Vec<PathBuf> {
        DOTFILES
            .iter()
            .map(|n| self.home_path().join(".settings/dotfiles").join(n))
            .collect()
    }

    /// Absolute paths of every bin source.
    pub fn bin_sources(&self) -> Vec<PathBuf> {
        BIN_FILES
            .iter()
            .map(|n| self.home_path().join(".settings/bin").join(n))
            .collect()
    }

    /// Settings linking every dotfile into the home with a `.` prefix.
    pub fn dotfile_settings(&self, policy: ConflictPolicy) -> Settings {
        Settings {
            prefix: ".".to_string(),
            on_conflict: policy,
            dry_run: false,
            source_paths: self.dotfile_sources(),
            dest_path: self.home_path().to_path_buf(),
        }
    }

    /// Render `path` relative to the home, for stable snapshots.
    pub fn display(&self, path: &Path) -> String {
        path.strip_prefix(self.home_path())
            .map_or_else(|_| path.display().to_string(), |p| format!("~/{}", p.display()))
    }

    /// Names of entries in `dir` whose names start with `prefix`.
    pub fn entries_starting_with(&self, dir: &Path, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .expect("read dir")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(prefix))
            .collect();
        names.sort();
        names
    }
}

/// Fluent builder for [`IntegrationTestContext`].
///
/// Allows individual tests to put things in the way of the links before the
/// context is finalised.
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a new context backed by the fixture tree.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Write a regular file at `rel` (relative to the home).
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        let path = self.ctx.home_path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write file");
        self
    }

    /// Create a directory at `rel` (relative to the home).
    pub fn with_dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.ctx.home_path().join(rel)).expect("create dir");
        self
    }

    /// Create a symlink at `rel` (relative to the home) pointing to `target`.
    #[cfg(unix)]
    pub fn with_symlink(self, rel: &str, target: &str) -> Self {
        std::os::unix::fs::symlink(target, self.ctx.home_path().join(rel)).expect("create symlink");
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}
