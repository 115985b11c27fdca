//! Scanner module for file enumeration and content hashing.
//!
//! The scanner is divided into submodules:
//! - [`walker`]: sequential recursive enumeration of regular files
//! - [`hasher`]: xxh64 fingerprinting (bounded prefix and full content)

pub mod hasher;
pub mod walker;

use std::path::PathBuf;

pub use hasher::{Hasher, PARTIAL_HASH_LEN};
pub use walker::Walker;

/// A 64-bit content fingerprint.
///
/// Produced by `XxHash64` over either the first [`PARTIAL_HASH_LEN`]
/// bytes of a file or its entire content. Equality of full-content
/// fingerprints is treated as proof of identical content; no
/// byte-for-byte confirmation is performed.
pub type Hash64 = u64;

/// A discovered file and its byte length.
///
/// The size is read once from the filesystem during classification and
/// trusted for the remainder of the run; it is not re-verified before
/// deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }

    /// Byte length of the file-name component.
    ///
    /// This is the quantity the retention tie-break compares; a missing
    /// file name (e.g. a path ending in `..`) counts as zero.
    #[must_use]
    pub fn name_len(&self) -> usize {
        self.path.file_name().map_or(0, |n| n.len())
    }
}

/// Errors that can occur while enumerating or stat-ing files.
///
/// These are per-file and recoverable: the offending file is dropped
/// from the run and a warning is logged.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
///
/// Like [`ScanError`], these are per-file and never fatal to the run.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error against the path that produced it.
    #[must_use]
    pub fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}
