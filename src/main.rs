//! `dfi` binary entry point.

use anyhow::Result;
use clap::Parser;

use dfi_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose, "install");
    let log = logging::Logger::new("install");
    commands::install::run(&args, &log)
}
