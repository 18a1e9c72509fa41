//! Failure classification from exit code and tool output.
//!
//! The pattern list is data: callers extend it from
//! `pipeline.yaml`'s `contention-patterns` without touching control flow.

use std::fmt;

/// Substrings (matched case-insensitively) that mark resource contention.
pub const BUILTIN_CONTENTION_PATTERNS: &[&str] = &[
    "address already in use",
    "address in use",
    "eaddrinuse",
    "port is already allocated",
    "resource temporarily unavailable",
    "too many open files",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// A test or check genuinely failed.
    Assertion,
    /// Infrastructure conflict such as a bound port.
    Contention,
    /// Anything else that broke the tool itself.
    Infra,
    Timeout,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureCategory::Assertion => "assertion",
            FailureCategory::Contention => "contention",
            FailureCategory::Infra => "infra",
            FailureCategory::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Lower-cased contention patterns: the built-ins plus any extras.
#[derive(Debug, Clone)]
pub struct ContentionPatterns {
    patterns: Vec<String>,
}

impl Default for ContentionPatterns {
    fn default() -> Self {
        Self::with_extra(&[])
    }
}

impl ContentionPatterns {
    pub fn with_extra(extra: &[String]) -> Self {
        let patterns = BUILTIN_CONTENTION_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .chain(
                extra
                    .iter()
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty()),
            )
            .collect();
        Self { patterns }
    }

    /// The first pattern found in `output`, if any.
    pub fn find(&self, output: &[u8]) -> Option<&str> {
        let haystack = String::from_utf8_lossy(output).to_lowercase();
        self.patterns
            .iter()
            .find(|pattern| haystack.contains(pattern.as_str()))
            .map(String::as_str)
    }
}

/// Classify a finished command. Exit 0 is not a failure.
///
/// Contention wins over the exit code, so a worker that failed because of
/// a port conflict is never counted as a test failure.
pub fn classify(
    exit_code: i32,
    output: &[u8],
    patterns: &ContentionPatterns,
) -> Option<FailureCategory> {
    if exit_code == 0 {
        return None;
    }
    if patterns.find(output).is_some() {
        return Some(FailureCategory::Contention);
    }
    Some(match exit_code {
        1 => FailureCategory::Assertion,
        5 | 124 => FailureCategory::Timeout,
        _ => FailureCategory::Infra,
    })
}
