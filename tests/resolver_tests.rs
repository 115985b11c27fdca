//! Tie-break determinism and callback-surface tests.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::thread::sleep;
use std::time::Duration;

use dupesweep::engine::{Engine, EngineConfig, RunStats};
use dupesweep::progress::{Phase, ProgressCallback};
use tempfile::tempdir;

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

/// Spacing between file creations so creation timestamps order strictly.
const TIMESTAMP_GAP: Duration = Duration::from_millis(50);

#[test]
fn test_shorter_name_wins_created_first() {
    let dir = tempdir().unwrap();
    let short = write_file(dir.path(), "a.txt", b"identical");
    sleep(TIMESTAMP_GAP);
    let long = write_file(dir.path(), "ab.txt", b"identical");

    Engine::with_defaults().run(dir.path()).unwrap();

    assert!(short.exists());
    assert!(!long.exists());
}

#[test]
fn test_shorter_name_wins_created_last() {
    let dir = tempdir().unwrap();
    let long = write_file(dir.path(), "ab.txt", b"identical");
    sleep(TIMESTAMP_GAP);
    let short = write_file(dir.path(), "a.txt", b"identical");

    Engine::with_defaults().run(dir.path()).unwrap();

    // Name length dominates; timestamps are irrelevant here.
    assert!(short.exists());
    assert!(!long.exists());
}

#[test]
fn test_equal_names_newer_second_file_loses() {
    let dir = tempdir().unwrap();
    // a2 is created strictly later than a1. Whichever of the two the
    // resolver sees first, the tie-break removes the newer file.
    let a1 = write_file(dir.path(), "a1.txt", b"identical");
    sleep(TIMESTAMP_GAP);
    let a2 = write_file(dir.path(), "a2.txt", b"identical");

    let stats = Engine::with_defaults().run(dir.path()).unwrap();

    assert!(a1.exists());
    assert!(!a2.exists());
    assert_eq!(stats.duplicates_removed, 1);
}

#[test]
fn test_equal_names_older_second_file_wins() {
    let dir = tempdir().unwrap();
    // a2 is created strictly earlier than a1; the older file is kept
    // in either processing order.
    let a2 = write_file(dir.path(), "a2.txt", b"identical");
    sleep(TIMESTAMP_GAP);
    let a1 = write_file(dir.path(), "a1.txt", b"identical");

    let stats = Engine::with_defaults().run(dir.path()).unwrap();

    assert!(a2.exists());
    assert!(!a1.exists());
    assert_eq!(stats.duplicates_removed, 1);
}

#[derive(Default)]
struct RecordingCallback {
    last_processed: AtomicU64,
    last_total: AtomicU64,
    phases: Mutex<Vec<&'static str>>,
    completed: Mutex<Option<RunStats>>,
}

impl ProgressCallback for RecordingCallback {
    fn on_file_processed(&self, processed: u64, total: u64) {
        self.last_processed.fetch_max(processed, Ordering::SeqCst);
        self.last_total.store(total, Ordering::SeqCst);
    }

    fn on_phase_changed(&self, phase: Phase) {
        self.phases.lock().unwrap().push(phase.label());
    }

    fn on_complete(&self, stats: &RunStats) {
        *self.completed.lock().unwrap() = Some(*stats);
    }
}

#[test]
fn test_progress_callbacks_fire_in_order() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "x.txt", b"dup");
    write_file(dir.path(), "xy.txt", b"dup");
    write_file(dir.path(), "solo.txt", b"one of a kind");

    let callback = Arc::new(RecordingCallback::default());
    let config = EngineConfig::default().with_progress(callback.clone());
    let stats = Engine::new(config).run(dir.path()).unwrap();

    // Every enumerated file produced a processed event.
    assert_eq!(callback.last_processed.load(Ordering::SeqCst), 3);
    assert_eq!(callback.last_total.load(Ordering::SeqCst), 3);

    let phases = callback.phases.lock().unwrap().clone();
    assert_eq!(
        phases,
        vec!["reading files", "comparing files", "deleting files", "done"]
    );

    let completed = callback.completed.lock().unwrap().unwrap();
    assert_eq!(completed, stats);
    assert_eq!(completed.duplicates_removed, 1);
}

#[test]
fn test_interrupting_run_reports_interrupted() {
    use dupesweep::engine::EngineError;
    use std::sync::atomic::AtomicBool;

    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"dup");
    write_file(dir.path(), "b.txt", b"dup");

    let flag = Arc::new(AtomicBool::new(true));
    let config = EngineConfig::default().with_shutdown_flag(flag);
    let err = Engine::new(config).run(dir.path()).unwrap_err();

    assert!(matches!(err, EngineError::Interrupted));
    // Nothing may be deleted when the run is interrupted up front.
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.txt").exists());
}
