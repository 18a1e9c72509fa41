//! # lp-core
//!
//! Pipeline state machine and its collaborators for localpipe.
//!
//! ## Modules
//!
//! - [`config`]: `.localpipe/` configuration and env files
//! - [`logging`]: correlation ids, NDJSON structured logger, log retention
//! - [`exit_code`]: precedence-aware exit-code registry
//! - [`timeout`]: wall-clock budget guard
//! - [`classifier`]: failure categories from exit code and output
//! - [`steps`]: the `Step` trait, command runner and concrete steps
//! - [`retry`]: flaky-step retry policy
//! - [`parallel`]: parallel test execution with serial fallback
//! - [`state`]: run lifecycle transitions
//! - [`engine`]: the pipeline execution engine
//! - [`deploy`]: deploy step and deployment state store
//! - [`init`]: project scaffolding

pub mod classifier;
pub mod config;
pub mod deploy;
pub mod engine;
pub mod exit_code;
pub mod init;
pub mod logging;
pub mod parallel;
pub mod retry;
pub mod state;
pub mod steps;
pub mod timeout;
