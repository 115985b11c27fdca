//! Sequential directory walker for file enumeration.
//!
//! Produces the complete set of regular-file paths reachable from a root
//! directory by recursive descent, with no bound on depth or count.
//! Enumeration is deliberately sequential; the parallelism in the
//! pipeline lives in the per-stage worker pools, not in the walk.
//!
//! Symbolic links are not followed, which makes enumeration immune to
//! symlink loops (see DESIGN.md).

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::ScanError;

/// Directory walker for sequential file discovery.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
}

impl Walker {
    /// Create a new walker for the given root directory.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Enumerate every regular file under the root.
    ///
    /// Unreadable directory entries are logged at warn level, recorded
    /// in `errors`, and skipped; enumeration always runs to completion.
    /// Callers are expected to have validated the root beforehand (the
    /// engine fails fast on an invalid root before constructing a
    /// walker).
    #[must_use]
    pub fn collect_files(&self) -> (Vec<PathBuf>, Vec<ScanError>) {
        let mut paths = Vec::new();
        let mut errors = Vec::new();

        for entry in WalkDir::new(&self.root) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() {
                        paths.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    log::warn!("Failed to read directory entry {}: {}", path.display(), e);
                    errors.push(match e.into_io_error() {
                        Some(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
                            ScanError::PermissionDenied(path)
                        }
                        Some(io) => ScanError::Io { path, source: io },
                        None => ScanError::Io {
                            path,
                            source: std::io::Error::other("directory walk error"),
                        },
                    });
                }
            }
        }

        log::debug!("Enumerated {} files under {}", paths.len(), self.root.display());
        (paths, errors)
    }
}
