//! Command-line interface definitions for dupesweep.
//!
//! All arguments use the clap derive API.
//!
//! # Example
//!
//! ```bash
//! # Remove duplicates under a directory
//! dupesweep ~/Downloads
//!
//! # Report what would be removed without touching anything
//! dupesweep ~/Downloads --dry-run
//!
//! # Machine-readable statistics
//! dupesweep ~/Downloads --json
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Duplicate file remover.
///
/// dupesweep finds byte-identical files under a directory tree using a
/// three-stage filter (size, partial xxh64, full xxh64) and removes the
/// redundant copies, keeping the copy with the shorter name (ties broken
/// by creation time).
#[derive(Debug, Parser)]
#[command(name = "dupesweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to sweep for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Number of worker threads per pipeline stage (default: all cores)
    #[arg(long, value_name = "N", default_value = "0")]
    pub workers: usize,

    /// Report removals without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print final statistics (and errors) as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::parse_from(["dupesweep", "/tmp"]);
        assert_eq!(cli.path, PathBuf::from("/tmp"));
        assert_eq!(cli.workers, 0);
        assert!(!cli.dry_run);
        assert!(!cli.json);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "dupesweep",
            "/data",
            "--dry-run",
            "--json",
            "--workers",
            "8",
            "-vv",
        ]);
        assert!(cli.dry_run);
        assert!(cli.json);
        assert_eq!(cli.workers, 8);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_path_is_required() {
        assert!(Cli::try_parse_from(["dupesweep"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["dupesweep", "/tmp", "-q", "-v"]).is_err());
    }
}
