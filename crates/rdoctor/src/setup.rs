//! First-run setup of the collector connection.

use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use tracing::{info, warn};

use rdoctor_core::Config;

/// Whether setup should prompt: no key yet, setup allowed, interactive stdin.
pub fn should_prompt(config: &Config, allowed: bool) -> bool {
    allowed && !config.has_api_key() && std::io::stdin().is_terminal()
}

/// Prompt for the collector URL and API key, then persist them to `path`.
///
/// Blocks on the terminal; async callers run it on a blocking thread.
pub fn run_setup(config: &mut Config, path: &Path) -> Result<()> {
    let server_url: String = Input::new()
        .with_prompt("Log collector URL")
        .default(config.server_url.clone())
        .interact_text()?;
    let api_key: String = Password::new()
        .with_prompt("API key")
        .allow_empty_password(false)
        .interact()?;

    *config = answered(&server_url, &api_key)?;
    config
        .save(path)
        .with_context(|| format!("Could not save settings to {}", path.display()))?;
    info!(path = %path.display(), "Saved collector settings");
    Ok(())
}

/// Validate prompt answers into the configuration to persist.
fn answered(server_url: &str, api_key: &str) -> Result<Config> {
    let api_key = api_key.trim();
    anyhow::ensure!(!api_key.is_empty(), "API key must not be blank");
    let config = Config {
        server_url: server_url.trim().to_string(),
        api_key: Some(api_key.to_string()),
    };
    config
        .submit_log_url()
        .context("Collector URL from setup is not usable")?;
    Ok(config)
}

/// Run setup when needed; otherwise warn if forwarding will be anonymous.
pub fn ensure_configured(config: &mut Config, path: &Path, allowed: bool) -> Result<()> {
    if should_prompt(config, allowed) {
        return run_setup(config, path);
    }
    if !config.has_api_key() {
        warn!("No API key configured, forwarding without one (run interactively to set it up)");
    }
    Ok(())
}
