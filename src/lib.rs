//! Dotfile symlink installer.
//!
//! Links files and directories from a version-controlled tree into a target
//! directory as relative symlinks, resolving occupied destinations with a
//! configurable policy.
//!
//! The public API is organised into layers:
//!
//! - **[`paths`]**: pure path arithmetic (common ancestors, relative targets)
//! - **[`plan`]**: turn source paths into [`plan::LinkDescriptor`]s
//! - **[`apply`]** and **[`conflict`]**: make each link exist, idempotently
//! - **[`commands`]**: top-level orchestration behind the `dfi` binary
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

use std::path::PathBuf;

pub mod apply;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conflict;
pub mod error;
pub mod logging;
pub mod operations;
pub mod paths;
pub mod plan;
pub mod settings;
pub mod sources;

/// Version string: `DFI_VERSION` from the build environment when set,
/// otherwise the crate version.
pub const VERSION: &str = match option_env!("DFI_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// The user's home directory from `HOME` (or `USERPROFILE`), else `.`.
#[must_use]
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
}
