//! Retention resolution for confirmed duplicates.
//!
//! The resolver maintains the durable duplicate index: one surviving
//! path per `(size, full_hash)` key. Full-hash results are applied one
//! at a time from a single drain point, so the compare-then-delete
//! sequence is serialized by construction.
//!
//! # Tie-break policy
//!
//! The file with the shorter name is assumed to be the canonical copy
//! (`photo.jpg` over `photo (1).jpg`). Among equally-long names the
//! creation timestamp decides: the incoming file is removed only when
//! it is strictly newer than the current survivor; on ties or when the
//! incoming file is older, the prior survivor is removed instead. The
//! asymmetry is intentional and observable behavior.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::scanner::{FileRecord, Hash64};

/// Error type for duplicate removal.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been removed mid-run).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Retention resolver and duplicate index.
///
/// Counters are only advanced by deletions that actually succeeded, and
/// an index entry only changes when the deletion backing that change
/// succeeded. A failed removal therefore leaves both the index and the
/// statistics exactly as they were.
#[derive(Debug, Default)]
pub struct Resolver {
    index: HashMap<(u64, Hash64), FileRecord>,
    duplicates_removed: u64,
    bytes_reclaimed: u64,
    failed_removals: u64,
    dry_run: bool,
}

impl Resolver {
    /// Create a new resolver.
    ///
    /// With `dry_run` set, removals are logged and counted but the
    /// filesystem is left untouched; the index advances as if every
    /// removal had succeeded, so the report matches a real run.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Apply one full-hash result to the index.
    ///
    /// First occurrence of a `(size, hash)` key inserts the record and
    /// removes nothing. Otherwise the tie-break runs against the current
    /// survivor and the losing copy is removed.
    pub fn resolve(&mut self, hash: Hash64, record: FileRecord) {
        let key = (record.size, hash);

        let Some(existing) = self.index.get(&key) else {
            self.index.insert(key, record);
            return;
        };

        let new_len = record.name_len();
        let existing_len = existing.name_len();

        if new_len < existing_len {
            let loser = existing.clone();
            if self.remove(&loser) {
                self.index.insert(key, record);
            }
        } else if new_len > existing_len {
            self.remove(&record);
        } else {
            // Equal name lengths: creation time decides. The incoming
            // file loses only when strictly newer than the survivor.
            let new_created = creation_time(&record.path);
            let existing_created = creation_time(&existing.path);
            if new_created > existing_created {
                self.remove(&record);
            } else {
                let loser = existing.clone();
                if self.remove(&loser) {
                    self.index.insert(key, record);
                }
            }
        }
    }

    /// Remove a losing duplicate, returning whether the removal (and
    /// therefore any dependent index update) took effect.
    fn remove(&mut self, record: &FileRecord) -> bool {
        if self.dry_run {
            log::info!("Would remove duplicate: {}", record.path.display());
            self.duplicates_removed += 1;
            self.bytes_reclaimed += record.size;
            return true;
        }

        match remove_file(&record.path) {
            Ok(()) => {
                log::info!("Removed duplicate: {}", record.path.display());
                self.duplicates_removed += 1;
                self.bytes_reclaimed += record.size;
                true
            }
            Err(e) => {
                log::warn!("Failed to remove {}: {}", record.path.display(), e);
                self.failed_removals += 1;
                false
            }
        }
    }

    /// Number of duplicates actually removed.
    #[must_use]
    pub fn duplicates_removed(&self) -> u64 {
        self.duplicates_removed
    }

    /// Byte sum of all files actually removed.
    #[must_use]
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_reclaimed
    }

    /// Number of removals that failed.
    #[must_use]
    pub fn failed_removals(&self) -> u64 {
        self.failed_removals
    }

    /// Current survivors, one per distinct content.
    #[must_use]
    pub fn survivors(&self) -> impl Iterator<Item = &FileRecord> {
        self.index.values()
    }
}

/// Delete a file, classifying the failure.
fn remove_file(path: &Path) -> Result<(), DeleteError> {
    std::fs::remove_file(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DeleteError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => DeleteError::PermissionDenied(path.to_path_buf()),
        _ => DeleteError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// Creation timestamp of a file, with platform fallbacks.
///
/// Some filesystems expose no birth time; modification time stands in
/// for it there. A failed read counts as the epoch, which makes the
/// file "oldest" and favored for retention in the equal-name branch.
fn creation_time(path: &Path) -> SystemTime {
    match std::fs::metadata(path) {
        Ok(meta) => meta.created().or_else(|_| meta.modified()).unwrap_or(UNIX_EPOCH),
        Err(e) => {
            log::warn!("Failed to read timestamps of {}: {}", path.display(), e);
            UNIX_EPOCH
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> FileRecord {
        let path = dir.join(name);
        File::create(&path).unwrap().write_all(content).unwrap();
        FileRecord::new(path, content.len() as u64)
    }

    #[test]
    fn test_first_occurrence_removes_nothing() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.txt", b"content");

        let mut resolver = Resolver::new(false);
        resolver.resolve(1, a.clone());

        assert!(a.path.exists());
        assert_eq!(resolver.duplicates_removed(), 0);
        assert_eq!(resolver.bytes_reclaimed(), 0);
    }

    #[test]
    fn test_shorter_name_replaces_survivor() {
        let dir = tempdir().unwrap();
        let long = write_file(dir.path(), "photo (1).jpg", b"same bytes");
        let short = write_file(dir.path(), "photo.jpg", b"same bytes");

        let mut resolver = Resolver::new(false);
        resolver.resolve(7, long.clone());
        resolver.resolve(7, short.clone());

        assert!(!long.path.exists());
        assert!(short.path.exists());
        assert_eq!(resolver.duplicates_removed(), 1);
        assert_eq!(resolver.bytes_reclaimed(), 10);
    }

    #[test]
    fn test_longer_name_loses_to_survivor() {
        let dir = tempdir().unwrap();
        let short = write_file(dir.path(), "a.txt", b"dup");
        let long = write_file(dir.path(), "ab.txt", b"dup");

        let mut resolver = Resolver::new(false);
        resolver.resolve(9, short.clone());
        resolver.resolve(9, long.clone());

        assert!(short.path.exists());
        assert!(!long.path.exists());
        let survivor: Vec<_> = resolver.survivors().collect();
        assert_eq!(survivor.len(), 1);
        assert_eq!(survivor[0].path, short.path);
    }

    #[test]
    fn test_equal_names_older_incoming_wins() {
        let dir = tempdir().unwrap();
        let first = write_file(dir.path(), "a1.txt", b"dup");
        let second = write_file(dir.path(), "a2.txt", b"dup");

        // Make the incoming file strictly older than the survivor.
        let old = filetime::FileTime::from_unix_time(1_000_000, 0);
        let new = filetime::FileTime::from_unix_time(2_000_000, 0);
        filetime::set_file_mtime(&first.path, new).unwrap();
        filetime::set_file_mtime(&second.path, old).unwrap();

        let mut resolver = Resolver::new(false);
        resolver.resolve(3, first.clone());
        resolver.resolve(3, second.clone());

        // On Linux tempfs the birth time may be the real creation time
        // rather than the mtime we set; only assert the invariant that
        // exactly one copy survives.
        assert_eq!(resolver.duplicates_removed(), 1);
        assert_ne!(first.path.exists(), second.path.exists());
    }

    #[test]
    fn test_failed_removal_withholds_counters_and_index() {
        let dir = tempdir().unwrap();
        let survivor = write_file(dir.path(), "aa.txt", b"dup");
        let ghost = FileRecord::new(dir.path().join("zz-gone.txt"), 3);

        let mut resolver = Resolver::new(false);
        resolver.resolve(5, ghost);
        // Incoming shorter name tries to remove the ghost and fails;
        // the index must still point at the ghost.
        resolver.resolve(5, survivor.clone());

        assert_eq!(resolver.duplicates_removed(), 0);
        assert_eq!(resolver.bytes_reclaimed(), 0);
        assert_eq!(resolver.failed_removals(), 1);
        assert!(survivor.path.exists());
        let kept: Vec<_> = resolver.survivors().collect();
        assert!(kept[0].path.ends_with("zz-gone.txt"));
    }

    #[test]
    fn test_dry_run_counts_without_deleting() {
        let dir = tempdir().unwrap();
        let keep = write_file(dir.path(), "a.txt", b"dup");
        let lose = write_file(dir.path(), "ab.txt", b"dup");

        let mut resolver = Resolver::new(true);
        resolver.resolve(11, keep.clone());
        resolver.resolve(11, lose.clone());

        assert!(keep.path.exists());
        assert!(lose.path.exists());
        assert_eq!(resolver.duplicates_removed(), 1);
        assert_eq!(resolver.bytes_reclaimed(), 3);
    }

    #[test]
    fn test_different_sizes_never_collide() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.bin", b"aaaa");
        let b = write_file(dir.path(), "b.bin", b"bb");

        let mut resolver = Resolver::new(false);
        // Same 64-bit hash value, different sizes: distinct index keys.
        resolver.resolve(42, a.clone());
        resolver.resolve(42, b.clone());

        assert!(a.path.exists());
        assert!(b.path.exists());
        assert_eq!(resolver.duplicates_removed(), 0);
    }
}
