//! Run state management.

pub mod run;

pub use run::{
    abort_run, attempt_step, begin_step, complete_run, create_run, seal_step, start_run,
    time_out_run, StepAttempt, StepStart,
};
