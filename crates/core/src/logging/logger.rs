//! Structured, correlated logger.
//!
//! Every call produces one [`LogEntry`] serialized as a single JSON line.
//! The line is written with one `write_all` per sink while the logger lock
//! is held, so concurrent callers never interleave partial lines.

use chrono::{SecondsFormat, Utc};
use lp_protocol::log_models::{LogEntry, LogLevel, SourceContext};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// The fields of an entry before the logger stamps it.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub step: String,
    pub message: String,
    pub source: Option<SourceContext>,
    pub duration_ms: Option<u64>,
    pub exit_code: Option<i32>,
}

impl LogRecord {
    pub fn new(level: LogLevel, step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            step: step.into(),
            message: message.into(),
            source: None,
            duration_ms: None,
            exit_code: None,
        }
    }

    pub fn with_source(mut self, source: SourceContext) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration_ms(duration));
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }
}

struct Sinks {
    file: Option<File>,
    stdout: bool,
    entries: Vec<LogEntry>,
}

/// Logger bound to one run id.
///
/// Writes to stdout and/or an append-only log file and keeps every entry
/// it emitted in memory for the run summary.
pub struct StructuredLogger {
    run_id: Option<String>,
    log_path: Option<PathBuf>,
    sinks: Mutex<Sinks>,
}

impl StructuredLogger {
    /// A logger that only records entries in memory.
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: Some(run_id.into()),
            log_path: None,
            sinks: Mutex::new(Sinks {
                file: None,
                stdout: false,
                entries: Vec::new(),
            }),
        }
    }

    /// A logger for entries emitted before a run id exists.
    pub fn bootstrap() -> Self {
        Self {
            run_id: None,
            log_path: None,
            sinks: Mutex::new(Sinks {
                file: None,
                stdout: true,
                entries: Vec::new(),
            }),
        }
    }

    /// Also append every entry to `path`, creating it and its parent
    /// directories if needed.
    pub fn with_log_file(mut self, path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.lock().file = Some(file);
        self.log_path = Some(path.to_path_buf());
        Ok(self)
    }

    /// Echo every entry to stdout.
    pub fn with_stdout(self, enabled: bool) -> Self {
        self.lock().stdout = enabled;
        self
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Stamp, serialize and write a record.
    pub fn emit(&self, record: LogRecord) -> LogEntry {
        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: record.level,
            step: record.step,
            message: record.message,
            run_id: self.run_id.clone(),
            source: record.source,
            duration_ms: record.duration_ms,
            exit_code: record.exit_code,
        };

        let mut sinks = self.lock();
        match serde_json::to_string(&entry) {
            Ok(mut line) => {
                line.push('\n');
                if sinks.stdout {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    if let Err(err) = handle.write_all(line.as_bytes()).and_then(|()| handle.flush())
                    {
                        tracing::warn!("failed to write log entry to stdout: {err}");
                    }
                }
                if let Some(file) = sinks.file.as_mut() {
                    if let Err(err) = file.write_all(line.as_bytes()) {
                        tracing::warn!("failed to write log entry to log file: {err}");
                    }
                }
            }
            Err(err) => tracing::warn!("failed to serialize log entry: {err}"),
        }
        sinks.entries.push(entry.clone());
        entry
    }

    pub fn log(&self, level: LogLevel, step: &str, message: impl Into<String>) -> LogEntry {
        self.emit(LogRecord::new(level, step, message))
    }

    pub fn info(&self, step: &str, message: impl Into<String>) -> LogEntry {
        self.log(LogLevel::Info, step, message)
    }

    pub fn success(&self, step: &str, message: impl Into<String>) -> LogEntry {
        self.log(LogLevel::Success, step, message)
    }

    pub fn warn(&self, step: &str, message: impl Into<String>) -> LogEntry {
        self.log(LogLevel::Warn, step, message)
    }

    pub fn error(&self, step: &str, message: impl Into<String>) -> LogEntry {
        self.log(LogLevel::Error, step, message)
    }

    /// Every entry emitted so far, in order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().entries.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Sinks> {
        self.sinks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Capture the current file, line and enclosing function as a
/// [`SourceContext`](lp_protocol::log_models::SourceContext).
#[macro_export]
macro_rules! source_context {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        let name = name.strip_suffix("::__here").unwrap_or(name);
        $crate::logging::SourceContext {
            source_file: file!().to_string(),
            line_number: line!(),
            function_name: name.trim_end_matches("::{{closure}}").to_string(),
        }
    }};
}

/// Log a formatted message tagged with the call site.
///
/// ```rust,ignore
/// log_event!(logger, LogLevel::Info, "lint", "running {}", command);
/// ```
#[macro_export]
macro_rules! log_event {
    ($logger:expr, $level:expr, $step:expr, $($arg:tt)+) => {
        $logger.emit(
            $crate::logging::LogRecord::new($level, $step, format!($($arg)+))
                .with_source($crate::source_context!()),
        )
    };
}
