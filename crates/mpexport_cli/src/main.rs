mod cli;
mod commands;
mod config;
mod persistence;
mod progress;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use mpexport_logging::{mp_info, mp_warn, LogDestination};
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    mpexport_logging::initialize(
        log_destination(cli.global.log_file.clone()),
        level_for(cli.global.verbose),
    );

    let settings = config::load_settings(&cli.global)?;
    mp_info!(
        "Output to {:?} as {:?}",
        settings.output_dir,
        settings.format
    );

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            mp_warn!("Interrupted; finishing the current article");
            on_ctrl_c.cancel();
        }
    });

    commands::run(cli.command, &settings, cancel).await
}

fn log_destination(log_file: Option<std::path::PathBuf>) -> LogDestination {
    match log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    }
}

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
