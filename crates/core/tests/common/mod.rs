//! Common test utilities shared by the integration tests.
//!
//! - Fixtures: sample projects, scripted pipelines, engines
//! - Assertions over log entries and run results

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
