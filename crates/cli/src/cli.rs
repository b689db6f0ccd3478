use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pricescout_core::AppConfig;

use crate::{cache, search};

/// Find the best-matching listing for a product across Romanian storefronts
#[derive(Parser, Debug)]
#[command(name = "pricescout")]
#[command(version)]
#[command(about = "Resolve a product query to the best listing on each configured site", long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, env = "PRICESCOUT_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a query on each site (prompts when no query is given)
    Search(SearchArgs),

    /// Inspect the result cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SearchArgs {
    /// Product name, e.g. `samsung galaxy s23 128gb`
    pub query: Vec<String>,

    /// Site to search; repeat for several. Defaults to the configured list
    #[arg(long = "site", value_name = "NAME")]
    pub sites: Vec<String>,

    /// Use the short pacing delay profile
    #[arg(long)]
    pub bulk: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CacheCommand {
    /// Sites present in the cache
    Sites,

    /// Entries cached for a site
    List {
        site: String,

        #[arg(long)]
        json: bool,
    },

    /// Look a query up without touching the network
    Lookup {
        site: String,

        query: Vec<String>,

        /// Fall back to fuzzy title matching when the query was never resolved
        #[arg(long)]
        fuzzy: bool,
    },
}

/// Execute CLI command
pub async fn execute(cli: Cli, config: &AppConfig) -> Result<()> {
    match cli.command {
        Commands::Search(args) => search::run(config, &args).await,
        Commands::Cache(cmd) => cache::run(config, cmd).await,
    }
}

/// Join positional words into one query; `None` when nothing was given.
pub fn join_query(words: &[String]) -> Option<String> {
    let joined = words.iter().map(|w| w.trim()).filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}
