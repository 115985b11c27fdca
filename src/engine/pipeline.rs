//! Pipeline orchestration.
//!
//! [`Engine::run`] is the single entry point of a run: validate the
//! root, enumerate files, classify by size, fingerprint in two passes,
//! and resolve retention. Data flows strictly forward; each concurrent
//! stage joins completely before the next one starts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::progress::{Phase, ProgressCallback};
use crate::scanner::{FileRecord, Hash64, Hasher, Walker};

use super::classify::{self, ClassifyStats, StageContext};
use super::resolver::Resolver;

/// Summary statistics from one pipeline run.
///
/// Mutated only by the retention resolver, read by the presentation
/// layer once the run completes. Nothing persists across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Total number of files enumerated under the root
    pub total_files: u64,
    /// Number of duplicate files actually removed
    pub duplicates_removed: u64,
    /// Byte sum of all files actually removed
    pub bytes_reclaimed: u64,
}

impl RunStats {
    /// Number of files remaining after the run.
    #[must_use]
    pub fn retained_files(&self) -> u64 {
        self.total_files.saturating_sub(self.duplicates_removed)
    }

    /// Human-readable reclaimed byte count.
    #[must_use]
    pub fn reclaimed_display(&self) -> String {
        bytesize::ByteSize(self.bytes_reclaimed).to_string()
    }
}

/// Errors that abort a pipeline run.
///
/// Per-file read and delete failures never surface here; they are
/// logged and the run continues. Only an invalid root or an
/// interruption prevents a run from reporting final statistics.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// The provided root path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided root path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The run was interrupted by the user.
    #[error("Run interrupted by user")]
    Interrupted,
}

/// Configuration for the engine.
#[derive(Clone, Default)]
pub struct EngineConfig {
    /// Worker threads per stage pool; 0 selects the available
    /// hardware parallelism.
    pub workers: usize,
    /// Report removals without touching the filesystem.
    pub dry_run: bool,
    /// Optional shutdown flag checked at stage boundaries and before
    /// each removal.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("workers", &self.workers)
            .field("dry_run", &self.dry_run)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl EngineConfig {
    /// Set the per-stage worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism().map_or(1, usize::from)
        }
    }
}

/// Duplicate removal engine.
///
/// # Example
///
/// ```no_run
/// use dupesweep::engine::{Engine, EngineConfig};
/// use std::path::Path;
///
/// let engine = Engine::new(EngineConfig::default());
/// let stats = engine.run(Path::new("/some/dir")).unwrap();
/// println!(
///     "{} duplicates removed, {} reclaimed",
///     stats.duplicates_removed,
///     stats.reclaimed_display()
/// );
/// ```
pub struct Engine {
    config: EngineConfig,
    hasher: Arc<Hasher>,
}

impl Engine {
    /// Create a new engine with the given configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            hasher: Arc::new(Hasher::new()),
        }
    }

    /// Create a new engine with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    fn phase(&self, phase: Phase) {
        if let Some(ref progress) = self.config.progress {
            progress.on_phase_changed(phase);
        }
    }

    fn check_shutdown(&self) -> Result<(), EngineError> {
        if self.config.is_shutdown_requested() {
            Err(EngineError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Run the full pipeline against a root directory.
    ///
    /// Per-file errors (unreadable size, failed hash, failed removal)
    /// are logged and skipped; the run always reaches completion and
    /// reports final statistics unless the root is invalid or the run
    /// is interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PathNotFound`] or
    /// [`EngineError::NotADirectory`] before any work starts, and
    /// [`EngineError::Interrupted`] if the shutdown flag is observed.
    pub fn run(&self, root: &Path) -> Result<RunStats, EngineError> {
        if !root.exists() {
            return Err(EngineError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(EngineError::NotADirectory(root.to_path_buf()));
        }

        log::info!("Starting duplicate sweep of {}", root.display());
        self.check_shutdown()?;

        let ctx = StageContext {
            workers: self.config.effective_workers(),
            shutdown_flag: self.config.shutdown_flag.clone(),
            progress: self.config.progress.clone(),
        };
        let mut classify_stats = ClassifyStats::default();

        // Stage 1: enumerate, then read sizes concurrently.
        self.phase(Phase::ReadingFiles);
        let (paths, walk_errors) = Walker::new(root).collect_files();
        let total_files = paths.len() as u64;
        if !walk_errors.is_empty() {
            log::warn!("{} directory entries could not be read", walk_errors.len());
        }
        self.check_shutdown()?;

        let records = classify::read_sizes(paths, &ctx, &mut classify_stats);
        self.check_shutdown()?;

        // Stage 2: size buckets; singletons cannot be duplicates.
        let buckets = classify::group_by_size(records, &mut classify_stats);
        log::info!(
            "Size bucketing eliminated {} unique files, {} buckets remain",
            classify_stats.unique_sizes,
            buckets.len()
        );

        // Stage 3: partial fingerprints prune same-size false candidates.
        self.phase(Phase::ComparingFiles);
        let groups =
            classify::group_by_partial_hash(buckets, &self.hasher, &ctx, &mut classify_stats);
        self.check_shutdown()?;

        // Stage 4: full-content fingerprints, the final duplicate proof.
        let full_hashes = self.full_hash_stage(groups, &ctx);
        self.check_shutdown()?;

        // Stage 5: drain results sequentially through the resolver.
        self.phase(Phase::DeletingFiles);
        let mut resolver = Resolver::new(self.config.dry_run);
        for (record, hash) in full_hashes {
            self.check_shutdown()?;
            resolver.resolve(hash, record);
        }

        let stats = RunStats {
            total_files,
            duplicates_removed: resolver.duplicates_removed(),
            bytes_reclaimed: resolver.bytes_reclaimed(),
        };

        if resolver.failed_removals() > 0 {
            log::warn!("{} removals failed and were skipped", resolver.failed_removals());
        }
        log::info!(
            "Sweep complete: {} files, {} duplicates removed, {} reclaimed",
            stats.total_files,
            stats.duplicates_removed,
            stats.reclaimed_display()
        );

        self.phase(Phase::Done);
        if let Some(ref progress) = self.config.progress {
            progress.on_complete(&stats);
        }

        Ok(stats)
    }

    /// Compute full-content hashes for every remaining candidate.
    ///
    /// Results come back in candidate order (indexed parallel collect),
    /// which keeps resolver behavior deterministic for a given tree.
    fn full_hash_stage(
        &self,
        groups: HashMap<(u64, Hash64), Vec<FileRecord>>,
        ctx: &StageContext,
    ) -> Vec<(FileRecord, Hash64)> {
        let candidates: Vec<FileRecord> = {
            let mut keys: Vec<(u64, Hash64)> = groups.keys().copied().collect();
            keys.sort_unstable();
            let mut groups = groups;
            keys.into_iter()
                .flat_map(|key| groups.remove(&key).unwrap_or_default())
                .collect()
        };

        if candidates.is_empty() {
            log::debug!("No candidates survived partial hashing");
            return Vec::new();
        }

        log::info!("Computing full hashes for {} files", candidates.len());

        let hasher = self.hasher.clone();
        let pool = ctx.build_pool();
        let results: Vec<Option<(FileRecord, Hash64)>> = pool.install(|| {
            candidates
                .into_par_iter()
                .map(|record| {
                    if ctx.is_shutdown_requested() {
                        return None;
                    }
                    match hasher.full_hash(&record.path) {
                        Ok(hash) => Some((record, hash)),
                        Err(e) => {
                            log::warn!("Failed to hash {}: {}", record.path.display(), e);
                            None
                        }
                    }
                })
                .collect()
        });

        results.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_stats_retained() {
        let stats = RunStats {
            total_files: 10,
            duplicates_removed: 3,
            bytes_reclaimed: 3000,
        };
        assert_eq!(stats.retained_files(), 7);
    }

    #[test]
    fn test_effective_workers_default_is_nonzero() {
        let config = EngineConfig::default();
        assert!(config.effective_workers() >= 1);
    }

    #[test]
    fn test_missing_root_fails_fast() {
        let engine = Engine::with_defaults();
        let err = engine.run(Path::new("/definitely/not/a/real/dir")).unwrap_err();
        assert!(matches!(err, EngineError::PathNotFound(_)));
    }

    #[test]
    fn test_interrupted_before_work() {
        let flag = Arc::new(AtomicBool::new(true));
        let engine = Engine::new(EngineConfig::default().with_shutdown_flag(flag));
        let dir = tempfile::tempdir().unwrap();
        let err = engine.run(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::Interrupted));
    }
}
