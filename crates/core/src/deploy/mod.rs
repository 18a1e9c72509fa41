//! Deployment state and the deploy step.
//!
//! - `store`: atomic, durable current / last-known-good record
//! - `step`: git operations with bounded retry, recorded once

pub mod step;
pub mod store;

pub use step::{DeployReport, DeployStep, DEPLOY_FAILURE_EXIT_CODE};
pub use store::{DeploymentStateStore, StoreError, StoreResult};
