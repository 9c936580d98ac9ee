use anyhow::Result;
use colored::Colorize;

use crate::config::Config;

/// Point the CLI at a Berth server
pub fn run(api_url: String) -> Result<()> {
    let mut config = Config::load()?;
    config.api_url = Some(api_url.trim_end_matches('/').to_string());
    config.save()?;

    println!(
        "{} Using server {}",
        "✓".green().bold(),
        config.api_url().cyan()
    );
    Ok(())
}
