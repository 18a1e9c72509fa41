//! Process exit-code contract.
//!
//! The numeric values are consumed by external callers (hosted workflows,
//! shell wrappers) and must never change.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Exit codes returned by a pipeline run.
///
/// Codes 1-4 are substantive failures where a lower number wins; 5 is the
/// lowest-priority failure; 130 bypasses precedence entirely.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum ExitCode {
    Success,
    /// Lint still failing after the auto-fix pass.
    Lint,
    Test,
    Build,
    /// Missing or incompatible environment.
    Environment,
    Timeout,
    /// User interrupt (SIGINT).
    Interrupted,
}

impl ExitCode {
    pub fn code(&self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::Lint => 1,
            ExitCode::Test => 2,
            ExitCode::Build => 3,
            ExitCode::Environment => 4,
            ExitCode::Timeout => 5,
            ExitCode::Interrupted => 130,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExitCode::Success),
            1 => Some(ExitCode::Lint),
            2 => Some(ExitCode::Test),
            3 => Some(ExitCode::Build),
            4 => Some(ExitCode::Environment),
            5 => Some(ExitCode::Timeout),
            130 => Some(ExitCode::Interrupted),
            _ => None,
        }
    }

    /// Human-readable cause used in the run summary.
    pub fn cause(&self) -> &'static str {
        match self {
            ExitCode::Success => "all steps passed",
            ExitCode::Lint => "lint failed after auto-fix",
            ExitCode::Test => "tests failed",
            ExitCode::Build => "build failed",
            ExitCode::Environment => "environment validation failed",
            ExitCode::Timeout => "pipeline exceeded its time budget",
            ExitCode::Interrupted => "interrupted by user",
        }
    }

    /// True for the substantive quality/validation failures (1-4).
    pub fn is_substantive(&self) -> bool {
        matches!(
            self,
            ExitCode::Lint | ExitCode::Test | ExitCode::Build | ExitCode::Environment
        )
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}
