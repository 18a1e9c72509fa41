//! Exit-code registry.
//!
//! One registry exists per pipeline run. It is shared (behind an `Arc`) by
//! every step, including concurrently running test groups, and resolves
//! all reported failures to a single process exit code.

use lp_protocol::exit_models::ExitCode;
use std::sync::Mutex;

/// Resolve a reported code against the current one.
///
/// - 0 is replaced by any failure.
/// - A substantive code (1-4) is only replaced by a lower substantive code.
/// - Timeout (5) only replaces 0, and is replaced by any substantive code.
/// - Success (0), interrupt (130) and unknown codes never change the
///   current value.
pub fn apply_precedence(current: i32, candidate: i32) -> i32 {
    let Some(candidate_code) = ExitCode::from_code(candidate) else {
        return current;
    };

    match candidate_code {
        ExitCode::Success | ExitCode::Interrupted => current,
        ExitCode::Timeout => {
            if current == 0 {
                candidate
            } else {
                current
            }
        }
        ExitCode::Lint | ExitCode::Test | ExitCode::Build | ExitCode::Environment => {
            let current_is_substantive = ExitCode::from_code(current)
                .map(|code| code.is_substantive())
                .unwrap_or(false);
            if current_is_substantive && current <= candidate {
                current
            } else {
                candidate
            }
        }
    }
}

/// Precedence-aware accumulator of failure codes.
#[derive(Debug, Default)]
pub struct ExitCodeRegistry {
    current: Mutex<i32>,
}

impl ExitCodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure code and return the resolved value.
    pub fn report(&self, candidate: i32) -> i32 {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = apply_precedence(*current, candidate);
        *current
    }

    pub fn report_code(&self, code: ExitCode) -> i32 {
        self.report(code.code())
    }

    /// The current resolved exit code.
    pub fn resolve(&self) -> i32 {
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
