//! Progress reporting for the pipeline.
//!
//! The engine talks exclusively to the [`ProgressCallback`] trait; how
//! updates are rendered is the presentation layer's business. This
//! module also ships [`Progress`], the indicatif-based terminal
//! implementation used by the CLI binary.
//!
//! Callbacks fire from worker threads and must not block; indicatif's
//! bar updates are atomic and satisfy that requirement.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::RunStats;

/// The macroscopic stages a run announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Enumerating files and reading their sizes.
    ReadingFiles,
    /// Computing partial and full content fingerprints.
    ComparingFiles,
    /// Resolving retention and removing duplicates.
    DeletingFiles,
    /// The run has finished.
    Done,
}

impl Phase {
    /// Human-readable phase label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ReadingFiles => "reading files",
            Self::ComparingFiles => "comparing files",
            Self::DeletingFiles => "deleting files",
            Self::Done => "done",
        }
    }
}

/// Progress callbacks for a pipeline run.
///
/// Implementations must be `Send + Sync`; the per-file callback is
/// invoked concurrently from worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called as each file's size read completes during classification.
    ///
    /// # Arguments
    ///
    /// * `processed` - Number of files processed so far
    /// * `total` - Total number of enumerated files
    fn on_file_processed(&self, processed: u64, total: u64);

    /// Called at each macroscopic stage transition.
    fn on_phase_changed(&self, phase: Phase);

    /// Called once when the run completes.
    fn on_complete(&self, _stats: &RunStats) {}
}

/// No-op callback for callers that do not want progress reporting.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn on_file_processed(&self, _processed: u64, _total: u64) {}
    fn on_phase_changed(&self, _phase: Phase) {}
}

/// Terminal progress reporter using indicatif.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is displayed.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_file_processed(&self, processed: u64, total: u64) {
        if self.quiet {
            return;
        }
        let mut guard = self.bar.lock().unwrap();
        let bar = guard.get_or_insert_with(|| {
            let pb = ProgressBar::new(total);
            pb.set_style(Self::bar_style());
            pb
        });
        bar.set_position(processed);
    }

    fn on_phase_changed(&self, phase: Phase) {
        if self.quiet {
            return;
        }
        let guard = self.bar.lock().unwrap();
        match &*guard {
            Some(bar) if phase == Phase::Done => bar.finish_with_message(phase.label()),
            Some(bar) => bar.set_message(phase.label()),
            None => {}
        }
    }
}
