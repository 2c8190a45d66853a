//! rdoctor
//!
//! Runs a command, echoes its output unchanged and streams a timestamped copy
//! of every line to a log collector.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use rdoctor::forward::{ForwardSettings, WebSocketConnector};
use rdoctor_core::config::{self, Config};

/// Release builds inject `RDOCTOR_VERSION`; anything else is a dev build.
const VERSION: &str = match option_env!("RDOCTOR_VERSION") {
    Some(version) => version,
    None => "git",
};

#[derive(Parser, Debug)]
#[command(name = "rdoctor")]
#[command(version = VERSION, about = "Run a command and stream its output to a log collector")]
struct Args {
    /// Log collector URL (overrides the settings file)
    #[arg(long, env = "RDOCTOR_SERVER_URL")]
    server_url: Option<String>,

    /// API key for the log collector (overrides the settings file)
    #[arg(long, env = "RDOCTOR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Settings file path
    #[arg(long, env = "RDOCTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level filter (e.g. "info", "debug", "warn").
    #[arg(long, default_value = "info", env = "RDOCTOR_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "RDOCTOR_LOG_JSON")]
    log_json: bool,

    /// Never prompt for collector settings.
    #[arg(long)]
    no_setup: bool,

    /// Command to run, followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    rdoctor_core::tracing_init::init_tracing(
        &rdoctor_core::tracing_init::default_filter(&args.log_level),
        args.log_json,
    );

    let code = match run(args, VERSION).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(args: Args, version: &str) -> anyhow::Result<i32> {
    info!(version, command = ?args.command, "Starting rdoctor");

    let config_path = match args.config {
        Some(path) => path,
        None => config::global_config_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine config directory"))?,
    };
    let mut config = config::load_config(&config_path)
        .with_context(|| format!("Could not load settings from {}", config_path.display()))?;
    apply_cli_overrides(&mut config, args.server_url, args.api_key);

    let setup_allowed = !args.no_setup;
    let config = tokio::task::spawn_blocking(move || {
        rdoctor::setup::ensure_configured(&mut config, &config_path, setup_allowed)
            .map(|()| config)
    })
    .await
    .context("Setup task failed")??;

    let endpoint = config.submit_log_url()?;
    info!(endpoint = %redacted(&endpoint), "Forwarding output to collector");

    let code = rdoctor::runner::run(
        &args.command,
        WebSocketConnector::new(),
        endpoint.into(),
        &ForwardSettings::default(),
    )
    .await?;
    Ok(code)
}

fn apply_cli_overrides(config: &mut Config, server_url: Option<String>, api_key: Option<String>) {
    if let Some(url) = server_url {
        config.server_url = url;
    }
    if let Some(key) = api_key {
        config.api_key = Some(key);
    }
}

/// The endpoint without its query string, which carries the API key.
fn redacted(endpoint: &url::Url) -> String {
    let mut shown = endpoint.clone();
    shown.set_query(None);
    shown.into()
}
