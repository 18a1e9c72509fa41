use super::project_config;
use clap::Args;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use colored::Colorize;
use lp_core::deploy::DeploymentStateStore;
use lp_protocol::deployment_models::{DeploymentRecord, DeploymentStatus};
use std::path::Path;

#[derive(Args, Debug, Clone)]
pub struct StateArgs {
    /// Print the raw JSON record
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: StateArgs, project: &Path) -> Result<i32> {
    let config = project_config(project)?;
    let store = DeploymentStateStore::new(config.state_file());
    let record = store.load().wrap_err("failed to read deployment state")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", render(&record));
    }

    Ok(0)
}

fn render(record: &DeploymentRecord) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "Current deployment".bold()));
    match &record.current_deployment {
        Some(current) => {
            let status = match current.status {
                DeploymentStatus::Success => "success".green(),
                DeploymentStatus::Failure => "failure".red(),
            };
            out.push_str(&format!("  status:    {status}\n"));
            out.push_str(&format!("  commit:    {}\n", current.commit_sha));
            out.push_str(&format!("  id:        {}\n", current.deployment_id));
            out.push_str(&format!("  at:        {}\n", current.timestamp.to_rfc3339()));
            out.push_str(&format!(
                "  attempts:  {}\n",
                current.git_operations_attempts
            ));
        }
        None => out.push_str(&format!("  {}\n", "none".dimmed())),
    }

    out.push_str(&format!("{}\n", "Last known good".bold()));
    match &record.last_known_good {
        Some(good) => {
            out.push_str(&format!("  commit:    {}\n", good.commit_sha.green()));
            out.push_str(&format!("  id:        {}\n", good.deployment_id));
            out.push_str(&format!("  at:        {}\n", good.timestamp.to_rfc3339()));
        }
        None => out.push_str(&format!("  {}\n", "none".dimmed())),
    }

    out
}
