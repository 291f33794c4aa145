//! The `install` command: collect sources, plan, and link.
use anyhow::{Context as _, Result};

use crate::apply::{LinkApplier, Report};
use crate::cli::Cli;
use crate::config::FileConfig;
use crate::error::DfiError;
use crate::logging::{Log, Logger};
use crate::operations::{FileSystemOps, SystemFileSystemOps};
use crate::plan::PlanBuilder;
use crate::settings::Settings;
use crate::sources;

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the config file, the source list, planning or any
/// link fails.
pub fn run(cli: &Cli, log: &Logger) -> Result<()> {
    log.debug(&format!("dfi {}", crate::VERSION));

    log.stage("Resolving settings");
    let file_config =
        FileConfig::load(cli.config.as_deref()).context("loading configuration file")?;
    let fs = SystemFileSystemOps;

    let (source_args, _) = cli
        .split_paths()
        .context("expected at least one source and a destination")?;
    let sources = sources::collect(source_args, std::io::stdin().lock(), cli.separator(), &fs)
        .context("collecting sources")?;
    let settings = Settings::resolve(cli, &file_config, sources)?;
    log.debug(&format!(
        "prefix: {:?}, on conflict: {}, dry run: {}",
        settings.prefix, settings.on_conflict, settings.dry_run
    ));

    if settings.source_paths.is_empty() {
        log.warn("no sources given, nothing to link");
    }

    install(&settings, &fs, log)?;
    log.print_summary();
    Ok(())
}

/// Plan and apply every link described by `settings`.
///
/// A failure is logged at error level before it is returned.
///
/// # Errors
///
/// Returns the first planning or link error; links applied before it stay
/// in place.
pub fn install(settings: &Settings, fs: &dyn FileSystemOps, log: &dyn Log) -> Result<Report, DfiError> {
    link_all(settings, fs, log).inspect_err(|e| log.error(&e.to_string()))
}

fn link_all(settings: &Settings, fs: &dyn FileSystemOps, log: &dyn Log) -> Result<Report, DfiError> {
    log.stage("Planning links");
    let plan = PlanBuilder::new(fs).build(
        &settings.source_paths,
        &settings.dest_path,
        &settings.prefix,
    )?;
    for descriptor in &plan {
        log.debug(&descriptor.to_string());
    }
    log.info(&format!(
        "{} link(s) into {}",
        plan.len(),
        settings.dest_path.display()
    ));

    log.stage(if settings.dry_run {
        "Linking (dry run)"
    } else {
        "Linking"
    });
    let report = LinkApplier::new(fs, log, settings.on_conflict, settings.dry_run).apply_all(&plan)?;
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::conflict::ConflictPolicy;
    use crate::error::LinkError;
    use crate::logging::{LogLevel, MemoryLog};
    use std::path::PathBuf;

    fn settings(sources: Vec<PathBuf>, dest: PathBuf) -> Settings {
        Settings {
            prefix: ".".to_string(),
            on_conflict: ConflictPolicy::Backup,
            dry_run: false,
            source_paths: sources,
            dest_path: dest,
        }
    }

    #[test]
    fn duplicate_names_fail_before_any_link() {
        let home = tempfile::tempdir().unwrap();
        for dir in ["a", "b"] {
            std::fs::create_dir(home.path().join(dir)).unwrap();
            std::fs::write(home.path().join(dir).join("bashrc"), "").unwrap();
        }
        let s = settings(
            vec![home.path().join("a/bashrc"), home.path().join("b/bashrc")],
            home.path().to_path_buf(),
        );
        let err = install(&s, &SystemFileSystemOps, &MemoryLog::new()).unwrap_err();
        assert!(matches!(
            err,
            DfiError::Link(LinkError::DuplicateLinkName { .. })
        ));
        assert!(home.path().join(".bashrc").symlink_metadata().is_err());
    }

    #[test]
    fn failure_is_logged_as_error() {
        let home = tempfile::tempdir().unwrap();
        let log = MemoryLog::new();
        let s = settings(vec![home.path().join("x")], home.path().join("nope"));

        let err = install(&s, &SystemFileSystemOps, &log).unwrap_err();

        assert_eq!(log.messages_at(LogLevel::Error), vec![err.to_string()]);
    }

    #[test]
    fn missing_destination_is_rejected() {
        let home = tempfile::tempdir().unwrap();
        let s = settings(vec![home.path().join("x")], home.path().join("nope"));
        let err = install(&s, &SystemFileSystemOps, &MemoryLog::new()).unwrap_err();
        assert!(matches!(err, DfiError::Link(LinkError::NotADirectory { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn logs_stages_in_order() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir(home.path().join("s")).unwrap();
        std::fs::write(home.path().join("s/vimrc"), "").unwrap();
        let mut s = settings(vec![home.path().join("s/vimrc")], home.path().to_path_buf());
        s.dry_run = true;
        let log = MemoryLog::new();

        install(&s, &SystemFileSystemOps, &log).unwrap();

        assert_eq!(
            log.messages_at(LogLevel::Stage),
            vec!["Planning links", "Linking (dry run)"]
        );
        assert!(home.path().join(".vimrc").symlink_metadata().is_err());
    }
}
