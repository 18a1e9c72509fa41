use super::project_config;
use chrono::Utc;
use clap::Args;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use lp_core::deploy::{DeployStep, DeploymentStateStore};
use lp_core::logging::{default_log_path, new_id, StructuredLogger};
use lp_core::steps::StepContext;
use std::path::Path;
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Commit sha to record instead of running the configured commit command
    #[arg(long)]
    pub commit: Option<String>,
}

pub async fn execute(args: DeployArgs, project: &Path) -> Result<i32> {
    let config = project_config(project)?;
    let log_path = default_log_path(&config.log_dir(), Utc::now());
    let logger = StructuredLogger::new(new_id())
        .with_stdout(true)
        .with_log_file(&log_path)
        .wrap_err_with(|| format!("failed to open log file {}", log_path.display()))?;

    let ctx = StepContext::new(config.root.clone(), Arc::new(logger));
    let step = DeployStep::new(
        config.pipeline.deploy.clone(),
        DeploymentStateStore::new(config.state_file()),
    )
    .with_commit(args.commit);

    let report = step
        .execute(&ctx)
        .await
        .wrap_err("failed to record deployment state")?;

    Ok(report.exit_code())
}
