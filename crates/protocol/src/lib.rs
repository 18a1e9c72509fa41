//! # lp-protocol
//!
//! Core data models shared by every localpipe crate.
//!
//! This crate defines the structures used for:
//! - Structured, correlated log entries (the NDJSON wire format)
//! - Pipeline run and step bookkeeping
//! - The process exit-code contract
//! - Durable deployment state
//! - Project configuration files (`config.toml`, `pipeline.yaml`)
//!
//! ## Modules
//!
//! - [`log_models`]: Log levels, source context and log entries
//! - [`run_models`]: Pipeline runs, step names and step results
//! - [`exit_models`]: Exit codes and their precedence categories
//! - [`deployment_models`]: Current and last-known-good deployment records
//! - [`config_models`]: Settings and pipeline definition files
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, chrono and uuid
//! - TypeScript generation: wire types derive `TS` so the dashboard can
//!   consume the log stream and state file without hand-written bindings
//! - Independent compilation: No dependencies on other localpipe crates

pub mod config_models;
pub mod deployment_models;
pub mod exit_models;
pub mod log_models;
pub mod run_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use deployment_models::*;
pub use exit_models::*;
pub use log_models::*;
pub use run_models::*;
