//! Check command - pre-flight configuration and connectivity checks

use anyhow::Result;
use colored::Colorize;

use sqlrelay_core::config::Credentials;
use sqlrelay_core::services::CheckStatus;
use sqlrelay_core::CheckService;

use super::get_config;

pub fn run(probe: bool, json: bool) -> Result<()> {
    let config = get_config();
    let credentials = Credentials::from_env().ok();

    let service = CheckService::new(config, credentials);
    let report = service.run_checks(probe)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for check in &report.checks {
            let marker = match check.status {
                CheckStatus::Pass => "ok".green(),
                CheckStatus::Warn => "warn".yellow(),
                CheckStatus::Fail => "fail".red(),
            };
            println!("{:>6}  {}: {}", marker, check.name.bold(), check.message);
        }
    }

    if !report.ok() {
        anyhow::bail!("One or more checks failed");
    }

    Ok(())
}
