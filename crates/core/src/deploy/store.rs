//! Durable deployment state.
//!
//! The record lives in one JSON document. Every write replaces the file
//! atomically: the new content goes to a temporary file in the same
//! directory, is synced, then renamed over the old one. A temporary file
//! that never gets persisted is deleted when dropped.

use lp_protocol::deployment_models::{
    CurrentDeployment, DeploymentRecord, DeploymentStatus, LastKnownGood,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read deployment state {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Deployment state {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize deployment state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write deployment state {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub struct DeploymentStateStore {
    path: PathBuf,
}

impl DeploymentStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record; a missing file is an empty record.
    pub fn load(&self) -> StoreResult<DeploymentRecord> {
        if !self.path.exists() {
            return Ok(DeploymentRecord::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        if content.trim().is_empty() {
            return Ok(DeploymentRecord::default());
        }

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Store `attempt` as the current deployment.
    ///
    /// The last-known-good slot is replaced only when the attempt
    /// succeeded; a failed deploy never erases the rollback target.
    pub fn record(&self, attempt: &CurrentDeployment) -> StoreResult<DeploymentRecord> {
        let mut record = self.load()?;

        record.current_deployment = Some(attempt.clone());
        if attempt.status == DeploymentStatus::Success {
            record.last_known_good = Some(LastKnownGood::from(attempt));
        }

        self.write_atomic(&record)?;
        tracing::debug!(path = %self.path.display(), "deployment state written");
        Ok(record)
    }

    fn write_atomic(&self, record: &DeploymentRecord) -> StoreResult<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        std::fs::create_dir_all(&parent).map_err(write_err)?;

        let mut content = serde_json::to_vec_pretty(record)?;
        content.push(b'\n');

        let mut temp = NamedTempFile::new_in(&parent).map_err(write_err)?;
        temp.write_all(&content).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.path)
            .map_err(|err| write_err(err.error))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;
    use uuid::Uuid;

    fn attempt(status: DeploymentStatus, sha: &str) -> CurrentDeployment {
        CurrentDeployment {
            deployment_id: Uuid::new_v4(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).unwrap(),
            commit_sha: sha.to_string(),
            status,
            git_operations_attempts: 1,
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = DeploymentStateStore::new(dir.path().join("state.json"));

        let record = store.load().unwrap();
        assert!(record.current_deployment.is_none());
        assert!(record.last_known_good.is_none());
    }

    #[test]
    fn test_success_updates_last_known_good() {
        let dir = tempdir().unwrap();
        let store = DeploymentStateStore::new(dir.path().join("nested/state.json"));
        let good = attempt(DeploymentStatus::Success, "abc123");

        let record = store.record(&good).unwrap();

        assert_eq!(record.current_deployment.as_ref(), Some(&good));
        let lkg = record.last_known_good.unwrap();
        assert_eq!(lkg.deployment_id, good.deployment_id);
        assert_eq!(lkg.commit_sha, "abc123");
        assert_eq!(store.load().unwrap().current_deployment, Some(good));
    }

    #[test]
    fn test_failure_keeps_last_known_good() {
        let dir = tempdir().unwrap();
        let store = DeploymentStateStore::new(dir.path().join("state.json"));
        let good = attempt(DeploymentStatus::Success, "abc123");
        let bad = attempt(DeploymentStatus::Failure, "def456");

        store.record(&good).unwrap();
        let before = store.load().unwrap().last_known_good;
        let record = store.record(&bad).unwrap();

        assert_eq!(record.current_deployment.unwrap().commit_sha, "def456");
        assert_eq!(record.last_known_good, before);
    }

    #[test]
    fn test_failure_on_empty_record_leaves_slot_empty() {
        let dir = tempdir().unwrap();
        let store = DeploymentStateStore::new(dir.path().join("state.json"));

        let record = store
            .record(&attempt(DeploymentStatus::Failure, "def456"))
            .unwrap();

        assert!(record.last_known_good.is_none());
    }

    #[test]
    fn test_recording_same_success_twice_is_byte_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = DeploymentStateStore::new(&path);
        let good = attempt(DeploymentStatus::Success, "abc123");

        store.record(&good).unwrap();
        let first = std::fs::read(&path).unwrap();
        store.record(&good).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert!(first.ends_with(b"\n"));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let store = DeploymentStateStore::new(dir.path().join("state.json"));

        store
            .record(&attempt(DeploymentStatus::Success, "abc123"))
            .unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("state.json")]);
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = DeploymentStateStore::new(&path);

        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));
        assert!(store
            .record(&attempt(DeploymentStatus::Success, "abc123"))
            .is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
