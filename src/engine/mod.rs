//! Duplicate detection and removal engine.
//!
//! The pipeline runs four stages strictly forward:
//!
//! 1. **Enumerate** - sequential recursive walk ([`crate::scanner::Walker`])
//! 2. **Classify** - concurrent size reads, bucket by exact byte length
//! 3. **Fingerprint** - partial (first 4 KiB) then full-content xxh64,
//!    each stage pruning groups that can no longer contain duplicates
//! 4. **Resolve** - deterministic keep/remove tie-break and deletion
//!
//! Stages fan out into a rayon pool and join before the next stage
//! starts; resolver updates are applied sequentially from a single
//! drain point.

pub mod classify;
pub mod pipeline;
pub mod resolver;

pub use classify::{group_by_partial_hash, group_by_size, read_sizes, ClassifyStats};
pub use pipeline::{Engine, EngineConfig, EngineError, RunStats};
pub use resolver::{DeleteError, Resolver};
