//! Structured log entry models.
//!
//! Every event the orchestrator reports becomes exactly one [`LogEntry`],
//! serialized as one line of JSON. The serialized shape is [`WireLogEntry`];
//! [`LogEntry`] converts to and from it so that the source-context fields can
//! only ever appear all together.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Severity of a log entry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    /// A step or run finished successfully.
    Success,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the call site that emitted an entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct SourceContext {
    pub source_file: String,
    pub line_number: u32,
    pub function_name: String,
}

/// One logged event.
///
/// `run_id` is absent only for entries emitted while the process is still
/// bootstrapping (before a correlation id exists).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "WireLogEntry", into = "WireLogEntry")]
pub struct LogEntry {
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub timestamp: String,
    pub level: LogLevel,
    /// Step the event belongs to (`init`, `lint`, `complete`, ...).
    pub step: String,
    pub message: String,
    pub run_id: Option<String>,
    pub source: Option<SourceContext>,
    pub duration_ms: Option<u64>,
    pub exit_code: Option<i32>,
}

/// The flat on-the-wire representation of a [`LogEntry`].
///
/// Optional fields are omitted rather than written as `null`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(rename = "LogEntry")]
pub struct WireLogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub step: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub exit_code: Option<i32>,
}

/// Rejected when a wire entry carries only part of the source context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialSourceContext;

impl fmt::Display for PartialSourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("source_file, line_number and function_name must be present together")
    }
}

impl std::error::Error for PartialSourceContext {}

impl TryFrom<WireLogEntry> for LogEntry {
    type Error = PartialSourceContext;

    fn try_from(wire: WireLogEntry) -> Result<Self, Self::Error> {
        let source = match (wire.source_file, wire.line_number, wire.function_name) {
            (Some(source_file), Some(line_number), Some(function_name)) => Some(SourceContext {
                source_file,
                line_number,
                function_name,
            }),
            (None, None, None) => None,
            _ => return Err(PartialSourceContext),
        };

        Ok(LogEntry {
            timestamp: wire.timestamp,
            level: wire.level,
            step: wire.step,
            message: wire.message,
            run_id: wire.run_id,
            source,
            duration_ms: wire.duration_ms,
            exit_code: wire.exit_code,
        })
    }
}

impl From<LogEntry> for WireLogEntry {
    fn from(entry: LogEntry) -> Self {
        let (source_file, line_number, function_name) = match entry.source {
            Some(ctx) => (
                Some(ctx.source_file),
                Some(ctx.line_number),
                Some(ctx.function_name),
            ),
            None => (None, None, None),
        };

        WireLogEntry {
            timestamp: entry.timestamp,
            level: entry.level,
            step: entry.step,
            message: entry.message,
            run_id: entry.run_id,
            source_file,
            line_number,
            function_name,
            duration_ms: entry.duration_ms,
            exit_code: entry.exit_code,
        }
    }
}
