//! Setup command - configure the endpoint URL
//!
//! Only the endpoint is stored. The service key stays in the environment so
//! long-lived secrets never land in a file.

use anyhow::Result;
use colored::Colorize;
use dialoguer::Input;
use url::Url;

use sqlrelay_core::config::{Config, SERVICE_KEY_ENV};

use super::get_app_dir;

pub fn run(endpoint: Option<String>) -> Result<()> {
    let app_dir = get_app_dir();
    std::fs::create_dir_all(&app_dir)?;

    let mut config = Config::load(&app_dir).unwrap_or_default();

    let endpoint = match endpoint {
        Some(e) => e,
        None => Input::new()
            .with_prompt("Endpoint base URL (https://...)")
            .interact_text()?,
    };

    let parsed = Url::parse(&endpoint)?;
    if parsed.scheme() != "https" {
        anyhow::bail!("Endpoint URL must use HTTPS");
    }
    if parsed.host_str().is_none() {
        anyhow::bail!("Endpoint URL must include a host");
    }

    config.endpoint = Some(endpoint.trim_end_matches('/').to_string());
    config.save(&app_dir)?;

    println!("{} Endpoint saved", "Success!".green());
    println!();
    println!("The service key is never stored. Before applying, export it:");
    println!("  export {}=<service key>", SERVICE_KEY_ENV);
    println!();
    println!("Then run 'sqr check --probe' to verify the connection.");

    Ok(())
}
