//! dupesweep - Duplicate File Remover
//!
//! Entry point for the dupesweep CLI binary.

use std::sync::Arc;

use clap::Parser;
use dupesweep::{
    cli::Cli,
    engine::{Engine, EngineConfig, EngineError, RunStats},
    error::{ExitCode, StructuredError},
    logging::init_logging,
    progress::Progress,
    signal,
};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(stats) => {
            report(&cli, &stats);
            std::process::exit(ExitCode::Success.as_i32());
        }
        Err(err) => {
            let exit_code = match err.downcast_ref::<EngineError>() {
                Some(EngineError::Interrupted) => ExitCode::Interrupted,
                Some(EngineError::PathNotFound(_) | EngineError::NotADirectory(_)) => {
                    ExitCode::InvalidPath
                }
                None => ExitCode::GeneralError,
            };

            if cli.json {
                let structured = StructuredError::new(&err, exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{json}");
                } else {
                    eprintln!("[{}] Error: {}", exit_code.code_prefix(), err);
                }
            } else {
                eprintln!("[{}] Error: {}", exit_code.code_prefix(), err);
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<RunStats> {
    let handler = signal::install_handler()?;

    let config = EngineConfig::default()
        .with_workers(cli.workers)
        .with_dry_run(cli.dry_run)
        .with_shutdown_flag(handler.get_flag())
        .with_progress(Arc::new(Progress::new(cli.quiet || cli.json)));

    let stats = Engine::new(config).run(&cli.path)?;
    Ok(stats)
}

fn report(cli: &Cli, stats: &RunStats) {
    if cli.json {
        match serde_json::to_string_pretty(stats) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to serialize statistics: {e}"),
        }
        return;
    }
    if cli.quiet {
        return;
    }

    let action = if cli.dry_run { "would be removed" } else { "removed" };
    println!("Files processed:  {}", stats.total_files);
    println!("Duplicates {action}: {}", stats.duplicates_removed);
    println!("Files retained:   {}", stats.retained_files());
    println!("Space reclaimed:  {}", stats.reclaimed_display());
}
