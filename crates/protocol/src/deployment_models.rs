//! Durable deployment state models.
//!
//! The deployment state file is a single JSON document with the top-level
//! keys `currentDeployment` and `lastKnownGood`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Success,
    Failure,
}

/// Outcome of the most recent deployment attempt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct CurrentDeployment {
    #[ts(type = "string")]
    pub deployment_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub commit_sha: String,
    pub status: DeploymentStatus,
    /// How many times the git operation sequence was attempted (1-3).
    pub git_operations_attempts: u32,
}

/// The most recent successful deployment; the rollback target.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct LastKnownGood {
    #[ts(type = "string")]
    pub deployment_id: Uuid,
    pub commit_sha: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&CurrentDeployment> for LastKnownGood {
    fn from(current: &CurrentDeployment) -> Self {
        Self {
            deployment_id: current.deployment_id,
            commit_sha: current.commit_sha.clone(),
            timestamp: current.timestamp,
        }
    }
}

/// The persisted record. Both slots are empty before the first deploy.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    #[serde(default)]
    pub current_deployment: Option<CurrentDeployment>,
    #[serde(default)]
    pub last_known_good: Option<LastKnownGood>,
}
