//! Structured, correlated logging.
//!
//! - `correlation`: run id generation
//! - `logger`: NDJSON logger with call-site capture
//! - `retention`: removal of expired log files

pub mod correlation;
pub mod logger;
pub mod retention;

pub use correlation::{generate_with, is_valid_run_id, new_id, GeneratedId};
pub use logger::{LogRecord, StructuredLogger};
pub use lp_protocol::log_models::{LogEntry, LogLevel, SourceContext};
pub use retention::{cleanup_logs, retention_window, RetentionReport};

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Default log file for a run: `<log_dir>/<YYYYMMDD-HHMMSS>/pipeline.log`.
pub fn default_log_path(log_dir: &Path, start: DateTime<Utc>) -> PathBuf {
    log_dir
        .join(start.format("%Y%m%d-%H%M%S").to_string())
        .join("pipeline.log")
}
