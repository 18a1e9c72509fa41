//! Correlation id generation.
//!
//! Format: `run-YYYYMMDD-HHMMSS-xxxxxx` where the timestamp is UTC at second
//! resolution and the suffix is six characters from `[0-9a-z]`.

use chrono::{DateTime, Utc};

use crate::logging::logger::StructuredLogger;

const SUFFIX_LEN: usize = 6;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A generated id and whether it fell back to the process id suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedId {
    pub id: String,
    /// True when no randomness was available. Such ids are only unique
    /// among concurrently running processes.
    pub degraded: bool,
}

impl GeneratedId {
    /// Take the id, warning on `bootstrap` first when it is degraded.
    pub fn into_run_id(self, bootstrap: &StructuredLogger) -> String {
        if self.degraded {
            bootstrap.warn(
                "init",
                "randomness source unavailable, using process id as run id suffix",
            );
        }
        self.id
    }
}

/// Generate a new run id for the current instant.
///
/// When the OS randomness source fails, the process id is used as the
/// suffix and a bootstrap warning without `run_id` goes to stdout.
pub fn new_id() -> String {
    generate_with(Utc::now(), getrandom::getrandom).into_run_id(&StructuredLogger::bootstrap())
}

/// Generate an id from an explicit clock reading and random source.
pub fn generate_with<E>(
    now: DateTime<Utc>,
    fill: impl FnOnce(&mut [u8]) -> Result<(), E>,
) -> GeneratedId {
    let mut bytes = [0u8; SUFFIX_LEN];
    let (suffix, degraded) = match fill(&mut bytes) {
        Ok(()) => (
            bytes
                .iter()
                .map(|b| ALPHABET[usize::from(*b) % ALPHABET.len()] as char)
                .collect::<String>(),
            false,
        ),
        Err(_) => (pid_suffix(std::process::id()), true),
    };

    GeneratedId {
        id: format!("{}-{suffix}", now.format("run-%Y%m%d-%H%M%S")),
        degraded,
    }
}

/// The process id in base 36, zero-padded or truncated to the suffix length.
fn pid_suffix(pid: u32) -> String {
    let mut digits = Vec::new();
    let mut rest = pid;
    loop {
        digits.push(ALPHABET[(rest % 36) as usize] as char);
        rest /= 36;
        if rest == 0 {
            break;
        }
    }
    while digits.len() < SUFFIX_LEN {
        digits.push('0');
    }
    digits.truncate(SUFFIX_LEN);
    digits.into_iter().rev().collect()
}

/// Check that a string has the run id shape.
pub fn is_valid_run_id(candidate: &str) -> bool {
    let parts: Vec<&str> = candidate.split('-').collect();
    let [prefix, date, time, suffix] = parts.as_slice() else {
        return false;
    };

    *prefix == "run"
        && date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && time.len() == 6
        && time.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}
