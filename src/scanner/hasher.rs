//! xxh64 file hasher with streaming support.
//!
//! Two fingerprints drive the pipeline:
//! - [`Hasher::partial_hash`]: the first [`PARTIAL_HASH_LEN`] bytes only,
//!   cheap enough to run over every size-bucket candidate.
//! - [`Hasher::full_hash`]: the entire content, streamed in fixed-size
//!   chunks from offset zero (the already-hashed prefix is not reused;
//!   correctness requires hashing the whole stream from the start).
//!
//! Fingerprints are `XxHash64` with seed 0. Full-hash equality is
//! accepted as definitive proof of identical content; the false-match
//! probability of a 64-bit hash is accepted as a deliberate
//! precision/performance trade-off.

use std::fs::File;
use std::hash::Hasher as _;
use std::io::Read;
use std::path::Path;

use twox_hash::XxHash64;

use super::{Hash64, HashError};

/// Number of prefix bytes covered by the partial fingerprint.
pub const PARTIAL_HASH_LEN: usize = 4096;

/// Read chunk size for full-content streaming.
const CHUNK_LEN: usize = 4096;

/// xxh64 content hasher.
///
/// Stateless; a single instance is shared across worker threads.
#[derive(Debug, Default)]
pub struct Hasher;

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Hash the first [`PARTIAL_HASH_LEN`] bytes of a file.
    ///
    /// Files shorter than the prefix are hashed in full; the result for
    /// such files is identical to their full-content hash.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn partial_hash(&self, path: &Path) -> Result<Hash64, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut buffer = vec![0u8; PARTIAL_HASH_LEN];
        let mut filled = 0;

        // A single read may return short even mid-file; keep filling
        // until the prefix is complete or the file ends.
        while filled < PARTIAL_HASH_LEN {
            let n = file
                .read(&mut buffer[filled..])
                .map_err(|e| HashError::from_io(path, e))?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&buffer[..filled]);
        Ok(hasher.finish())
    }

    /// Hash the entire content of a file, streamed in chunks.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn full_hash(&self, path: &Path) -> Result<Hash64, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = XxHash64::with_seed(0);
        let mut buffer = [0u8; CHUNK_LEN];

        loop {
            let n = file
                .read(&mut buffer)
                .map_err(|e| HashError::from_io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.write(&buffer[..n]);
        }

        Ok(hasher.finish())
    }
}

/// Hash a byte slice with the pipeline's fingerprint function.
///
/// Exposed for tests that need to predict on-disk fingerprints.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> Hash64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}
