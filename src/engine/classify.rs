//! Size classification and partial-hash grouping.
//!
//! Size bucketing is the primary cost-reduction step: files with a
//! unique byte length cannot be duplicates and are discarded without a
//! single content read. Surviving buckets are then sub-grouped by a
//! partial fingerprint over the first 4 KiB, which eliminates most
//! same-size false candidates before any whole file is read.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::progress::ProgressCallback;
use crate::scanner::{FileRecord, Hash64, Hasher};

/// Shared context for the concurrent pipeline stages.
///
/// Carries the worker count used to size each stage's pool, the
/// shutdown flag checked inside workers, and the progress callback.
#[derive(Clone, Default)]
pub struct StageContext {
    /// Number of worker threads per stage pool.
    pub workers: usize,
    /// Optional shutdown flag; when set, workers skip remaining items.
    pub shutdown_flag: Option<Arc<std::sync::atomic::AtomicBool>>,
    /// Optional progress callback for per-file events.
    pub progress: Option<Arc<dyn ProgressCallback>>,
}

impl StageContext {
    pub(crate) fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build the stage's worker pool.
    ///
    /// Falls back to the global pool configuration if a dedicated pool
    /// cannot be created.
    pub(crate) fn build_pool(&self) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .unwrap_or_else(|_| {
                log::warn!(
                    "Failed to create stage thread pool, using {} threads",
                    rayon::current_num_threads()
                );
                rayon::ThreadPoolBuilder::new().build().unwrap()
            })
    }
}

/// Statistics from the classification stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    /// Files whose size read failed (dropped from the run)
    pub unreadable: usize,
    /// Files discarded because their size was unique
    pub unique_sizes: usize,
    /// Files discarded because their size-and-prefix was unique
    pub unique_prefixes: usize,
    /// Files whose partial hash failed (dropped from the run)
    pub unhashable: usize,
}

/// Read file sizes concurrently and produce records in discovery order.
///
/// Every completed size read, successful or not, fires
/// `on_file_processed(processed, total)` on the progress callback.
/// Unreadable files are logged at warn level and dropped; this is a
/// local recovery, never fatal to the run.
pub fn read_sizes(
    paths: Vec<std::path::PathBuf>,
    ctx: &StageContext,
    stats: &mut ClassifyStats,
) -> Vec<FileRecord> {
    let total = paths.len() as u64;
    let processed = AtomicU64::new(0);

    let pool = ctx.build_pool();
    let results: Vec<Option<FileRecord>> = pool.install(|| {
        paths
            .into_par_iter()
            .map(|path| {
                if ctx.is_shutdown_requested() {
                    return None;
                }

                let record = match std::fs::metadata(&path) {
                    Ok(meta) => Some(FileRecord::new(path, meta.len())),
                    Err(e) => {
                        log::warn!("Failed to read size of {}: {}", path.display(), e);
                        None
                    }
                };

                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref progress) = ctx.progress {
                    progress.on_file_processed(done, total);
                }

                record
            })
            .collect()
    });

    // Indexed collect preserves input order, so discovery order survives
    // the unordered completion of the pool.
    let mut records = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Some(record) => records.push(record),
            None => stats.unreadable += 1,
        }
    }
    records
}

/// Group records into size buckets, pruning buckets of cardinality 1.
///
/// Every member of a returned bucket has the bucket's exact size, and
/// members keep their discovery order.
pub fn group_by_size(
    records: Vec<FileRecord>,
    stats: &mut ClassifyStats,
) -> HashMap<u64, Vec<FileRecord>> {
    let mut buckets: HashMap<u64, Vec<FileRecord>> = HashMap::new();
    for record in records {
        buckets.entry(record.size).or_default().push(record);
    }

    buckets.retain(|size, files| {
        if files.len() > 1 {
            log::debug!("Size bucket {}: {} candidates", size, files.len());
            true
        } else {
            stats.unique_sizes += 1;
            false
        }
    });
    buckets
}

/// Re-group size buckets by `(size, partial_hash)`, pruning singletons.
///
/// Partial hashes are computed concurrently across all bucket members.
/// A failed read drops the file from its bucket and the run continues.
pub fn group_by_partial_hash(
    buckets: HashMap<u64, Vec<FileRecord>>,
    hasher: &Hasher,
    ctx: &StageContext,
    stats: &mut ClassifyStats,
) -> HashMap<(u64, Hash64), Vec<FileRecord>> {
    let candidates: Vec<FileRecord> = {
        // Stable bucket order keeps the stage deterministic for tests.
        let mut sizes: Vec<u64> = buckets.keys().copied().collect();
        sizes.sort_unstable();
        let mut buckets = buckets;
        sizes
            .into_iter()
            .flat_map(|size| buckets.remove(&size).unwrap_or_default())
            .collect()
    };

    if candidates.is_empty() {
        return HashMap::new();
    }

    log::info!("Computing partial hashes for {} files", candidates.len());

    let pool = ctx.build_pool();
    let hashed: Vec<(FileRecord, Option<Hash64>)> = pool.install(|| {
        candidates
            .into_par_iter()
            .map(|record| {
                if ctx.is_shutdown_requested() {
                    return (record, None);
                }
                match hasher.partial_hash(&record.path) {
                    Ok(hash) => (record, Some(hash)),
                    Err(e) => {
                        log::warn!("Failed to hash prefix of {}: {}", record.path.display(), e);
                        (record, None)
                    }
                }
            })
            .collect()
    });

    let mut groups: HashMap<(u64, Hash64), Vec<FileRecord>> = HashMap::new();
    for (record, hash) in hashed {
        match hash {
            Some(hash) => groups.entry((record.size, hash)).or_default().push(record),
            None => stats.unhashable += 1,
        }
    }

    groups.retain(|_, files| {
        if files.len() > 1 {
            true
        } else {
            stats.unique_prefixes += 1;
            false
        }
    });
    groups
}
