//! dupesweep - Duplicate File Remover
//!
//! Finds byte-identical files under a directory tree and removes the
//! redundant copies, keeping exactly one representative per distinct
//! content. Detection runs a three-stage filter (size bucketing, partial
//! xxh64 of the first 4 KiB, full-content xxh64) before a deterministic
//! tie-break decides which copy survives.

pub mod cli;
pub mod engine;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod signal;
