#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
#![cfg(unix)]
//! Integration tests for linking a dotfiles tree into a home directory.
//!
//! These run the full plan-and-apply pipeline against a real temporary
//! filesystem through [`install`], the same entry point the `dfi` binary
//! uses after argument parsing.

mod common;

use std::path::PathBuf;

use common::{IntegrationTestContext, TestContextBuilder};
use dfi_cli::apply::LinkOutcome;
use dfi_cli::commands::install::install;
use dfi_cli::conflict::ConflictPolicy;
use dfi_cli::error::{DfiError, LinkError};
use dfi_cli::logging::{LinkStatus, LogLevel, MemoryLog};
use dfi_cli::operations::SystemFileSystemOps;
use dfi_cli::plan::PlanBuilder;

fn render_outcomes(ctx: &IntegrationTestContext, report: &dfi_cli::apply::Report) -> String {
    report
        .outcomes
        .iter()
        .map(|(d, o)| {
            let outcome = match o {
                LinkOutcome::Created => "created".to_string(),
                LinkOutcome::AlreadyCorrect => "ok".to_string(),
                LinkOutcome::Skipped { reason } => format!("skipped ({reason})"),
            };
            format!("{} -> {}: {outcome}", ctx.display(&d.link_path), d.link_target.display())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

#[test]
fn plan_for_bin_directory() {
    let ctx = IntegrationTestContext::new();
    let plan = PlanBuilder::new(&SystemFileSystemOps)
        .build(&ctx.bin_sources(), &ctx.home_path().join(".local/bin"), "")
        .unwrap();
    let rendered: Vec<String> = plan
        .iter()
        .map(|d| format!("{} -> {}", ctx.display(&d.link_path), d.link_target.display()))
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    ~/.local/bin/cat -> ../../.settings/bin/cat
    ~/.local/bin/dog -> ../../.settings/bin/dog
    ~/.local/bin/ls -> ../../.settings/bin/ls
    ");
}

#[test]
fn dest_must_be_a_directory() {
    let ctx = TestContextBuilder::new().with_file(".profile", "x").build();
    let mut settings = ctx.dotfile_settings(ConflictPolicy::Backup);
    settings.dest_path = ctx.home_path().join(".profile");
    let err = install(&settings, &SystemFileSystemOps, &MemoryLog::new()).unwrap_err();
    assert!(matches!(err, DfiError::Link(LinkError::NotADirectory { .. })));
}

// ---------------------------------------------------------------------------
// Fresh install and idempotence
// ---------------------------------------------------------------------------

#[test]
fn fresh_install_links_everything() {
    let ctx = IntegrationTestContext::new();
    let report = install(
        &ctx.dotfile_settings(ConflictPolicy::Backup),
        &SystemFileSystemOps,
        &MemoryLog::new(),
    )
    .unwrap();

    insta::assert_snapshot!(render_outcomes(&ctx, &report), @r"
    ~/.bashrc -> .settings/dotfiles/bashrc: created
    ~/.vimrc -> .settings/dotfiles/vimrc: created
    ~/.zshrc -> .settings/dotfiles/zshrc: created
    ");
    assert_eq!(
        std::fs::read_to_string(ctx.home_path().join(".vimrc")).unwrap(),
        "# vimrc\n"
    );
}

#[test]
fn second_run_changes_nothing() {
    let ctx = IntegrationTestContext::new();
    let settings = ctx.dotfile_settings(ConflictPolicy::Replace);
    install(&settings, &SystemFileSystemOps, &MemoryLog::new()).unwrap();

    let log = MemoryLog::new();
    let report = install(&settings, &SystemFileSystemOps, &log).unwrap();

    assert_eq!(report.already_correct(), 3);
    assert_eq!(report.created(), 0);
    assert!(
        log.links()
            .iter()
            .all(|e| e.status == LinkStatus::AlreadyCorrect)
    );
}

// ---------------------------------------------------------------------------
// Conflict policies
// ---------------------------------------------------------------------------

#[test]
fn backup_moves_existing_file_aside() {
    let ctx = TestContextBuilder::new()
        .with_file(".bashrc", "local bashrc")
        .build();

    let report = install(
        &ctx.dotfile_settings(ConflictPolicy::Backup),
        &SystemFileSystemOps,
        &MemoryLog::new(),
    )
    .unwrap();

    assert_eq!(report.created(), 3);
    let backups = ctx.entries_starting_with(ctx.home_path(), ".bashrc.bak_");
    assert_eq!(backups.len(), 1);
    assert_eq!(
        std::fs::read_to_string(ctx.home_path().join(&backups[0])).unwrap(),
        "local bashrc"
    );
    assert_eq!(
        std::fs::read_link(ctx.home_path().join(".bashrc")).unwrap(),
        PathBuf::from(".settings/dotfiles/bashrc")
    );
}

#[test]
fn replace_swaps_foreign_symlink() {
    let ctx = TestContextBuilder::new()
        .with_symlink(".zshrc", "/etc/zsh/zshrc.nope")
        .build();

    install(
        &ctx.dotfile_settings(ConflictPolicy::Replace),
        &SystemFileSystemOps,
        &MemoryLog::new(),
    )
    .unwrap();

    assert_eq!(
        std::fs::read_link(ctx.home_path().join(".zshrc")).unwrap(),
        PathBuf::from(".settings/dotfiles/zshrc")
    );
    assert!(
        ctx.entries_starting_with(ctx.home_path(), ".zshrc.bak_")
            .is_empty()
    );
}

#[test]
fn replace_never_removes_a_directory() {
    let ctx = TestContextBuilder::new().with_dir(".vimrc").build();

    let err = install(
        &ctx.dotfile_settings(ConflictPolicy::Replace),
        &SystemFileSystemOps,
        &MemoryLog::new(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        DfiError::Link(LinkError::DirectoryNotReplaced { .. })
    ));
    assert!(ctx.home_path().join(".vimrc").is_dir());
    // bashrc comes first and was linked before the failure.
    assert!(
        ctx.home_path()
            .join(".bashrc")
            .symlink_metadata()
            .unwrap()
            .is_symlink()
    );
}

#[test]
fn warn_skips_and_continues() {
    let ctx = TestContextBuilder::new()
        .with_file(".vimrc", "mine")
        .build();
    let log = MemoryLog::new();

    let report = install(
        &ctx.dotfile_settings(ConflictPolicy::Warn),
        &SystemFileSystemOps,
        &log,
    )
    .unwrap();

    insta::assert_snapshot!(render_outcomes(&ctx, &report), @r"
    ~/.bashrc -> .settings/dotfiles/bashrc: created
    ~/.vimrc -> .settings/dotfiles/vimrc: skipped (destination exists)
    ~/.zshrc -> .settings/dotfiles/zshrc: created
    ");
    assert_eq!(log.messages_at(LogLevel::Warn).len(), 1);
    assert_eq!(
        std::fs::read_to_string(ctx.home_path().join(".vimrc")).unwrap(),
        "mine"
    );
}

#[test]
fn fail_stops_at_first_conflict() {
    let ctx = TestContextBuilder::new()
        .with_file(".vimrc", "mine")
        .build();

    let err = install(
        &ctx.dotfile_settings(ConflictPolicy::Fail),
        &SystemFileSystemOps,
        &MemoryLog::new(),
    )
    .unwrap_err();

    assert!(err.to_string().contains("exists, exiting"));
    assert!(ctx.home_path().join(".bashrc").symlink_metadata().is_ok());
    assert!(ctx.home_path().join(".zshrc").symlink_metadata().is_err());
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[test]
fn dry_run_reports_without_touching_disk() {
    let ctx = TestContextBuilder::new()
        .with_file(".zshrc", "mine")
        .build();
    let mut settings = ctx.dotfile_settings(ConflictPolicy::Backup);
    settings.dry_run = true;
    let log = MemoryLog::new();

    let report = install(&settings, &SystemFileSystemOps, &log).unwrap();

    assert_eq!(report.created(), 3);
    assert!(ctx.home_path().join(".bashrc").symlink_metadata().is_err());
    assert_eq!(
        std::fs::read_to_string(ctx.home_path().join(".zshrc")).unwrap(),
        "mine"
    );
    assert!(
        ctx.entries_starting_with(ctx.home_path(), ".zshrc.bak_")
            .is_empty()
    );
    assert_eq!(log.messages_at(LogLevel::DryRun).len(), 4);
    assert!(log.links().iter().all(|e| e.status == LinkStatus::DryRun));
}
