use super::project_config;
use clap::Args;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use lp_core::engine::{PipelineEngine, RunOptions};
use lp_core::logging::{LogLevel, LogRecord};
use lp_protocol::exit_models::ExitCode;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Do not run the lint fix command on lint failure
    #[arg(long)]
    pub no_fix: bool,

    /// Echo raw tool output to stderr
    #[arg(long, short)]
    pub verbose: bool,

    /// Record every test step as skipped
    #[arg(long)]
    pub skip_tests: bool,

    /// Write the run log here instead of `<log_dir>/<start time>/pipeline.log`
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Walk the pipeline without running any command
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    fn options(self) -> RunOptions {
        RunOptions {
            auto_fix: !self.no_fix,
            verbose: self.verbose,
            skip_tests: self.skip_tests,
            dry_run: self.dry_run,
            log_file: self.log_file,
            stdout: true,
        }
    }
}

pub async fn execute(args: RunArgs, project: &Path) -> Result<i32> {
    let config = project_config(project)?;
    let engine = PipelineEngine::from_config(&config, &args.options()).map_err(|e| eyre!(e))?;
    let logger = engine.logger();

    // Biased so the signal handler is installed before the first step runs.
    // Dropping the run future kills any running child process.
    tokio::select! {
        biased;
        Ok(()) = tokio::signal::ctrl_c() => {
            let code = ExitCode::Interrupted.code();
            logger.emit(
                LogRecord::new(LogLevel::Error, "pipeline", "interrupted by user")
                    .with_exit_code(code)
                    .with_source(lp_core::source_context!()),
            );
            Ok(code)
        }
        run = engine.run() => Ok(run.exit_code),
    }
}
