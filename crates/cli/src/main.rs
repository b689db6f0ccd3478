//! pricescout entry point.
//!
//! Results go to stdout; logging goes to stderr so output stays pipeable.

use anyhow::{Context, Result};
use clap::Parser;
use pricescout_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod cache;
mod cli;
mod output;
mod search;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = AppConfig::load().context("loading configuration")?;
    tracing::debug!(cache = %config.cache_path.display(), sites = ?config.sites, "configuration loaded");

    cli::execute(cli, &config).await
}
