//! Log retention.
//!
//! Removes log files older than the retention window, then any per-run
//! directory left empty. Nothing here fails the pipeline: every problem is
//! collected into the report and logged as a warning by the caller.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

/// Outcome of a retention pass.
#[derive(Debug, Default)]
pub struct RetentionReport {
    pub removed_files: Vec<PathBuf>,
    pub removed_dirs: Vec<PathBuf>,
    /// Human-readable descriptions of entries that could not be removed.
    pub failures: Vec<String>,
}

impl RetentionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Retention window in days as a `Duration`.
pub fn retention_window(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(24 * 60 * 60))
}

/// Delete files under `dir` last modified more than `retention` before `now`.
///
/// A missing `dir` is not an error. `dir` itself is never removed.
pub fn cleanup_logs(dir: &Path, retention: Duration, now: SystemTime) -> RetentionReport {
    let mut report = RetentionReport::default();

    if !dir.exists() {
        return report;
    }

    let cutoff = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);

    // Children are visited before their parent so a directory emptied by
    // this pass can be removed in the same pass.
    for entry in WalkDir::new(dir).min_depth(1).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                report.failures.push(format!("failed to read log entry: {err}"));
                continue;
            }
        };
        let path = entry.path();

        if entry.file_type().is_dir() {
            if is_empty_dir(path) {
                match std::fs::remove_dir(path) {
                    Ok(()) => report.removed_dirs.push(path.to_path_buf()),
                    Err(err) => report
                        .failures
                        .push(format!("failed to remove {}: {err}", path.display())),
                }
            }
            continue;
        }

        let modified = match entry.metadata().map(|meta| meta.modified()) {
            Ok(Ok(modified)) => modified,
            Ok(Err(err)) => {
                report
                    .failures
                    .push(format!("failed to stat {}: {err}", path.display()));
                continue;
            }
            Err(err) => {
                report
                    .failures
                    .push(format!("failed to stat {}: {err}", path.display()));
                continue;
            }
        };

        if modified < cutoff {
            match std::fs::remove_file(path) {
                Ok(()) => report.removed_files.push(path.to_path_buf()),
                Err(err) => report
                    .failures
                    .push(format!("failed to remove {}: {err}", path.display())),
            }
        }
    }

    tracing::debug!(
        files = report.removed_files.len(),
        dirs = report.removed_dirs.len(),
        failures = report.failures.len(),
        "log retention pass finished"
    );

    report
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
