use std::sync::Arc;

use anyhow::{Context, Result, bail};
use pricescout_client::{
    FetchPolicy, HostThrottle, HttpConfig, HttpPageClient, Resolver, SiteProfile, ThrottledFetcher,
};
use pricescout_core::{AppConfig, CacheStore};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::{SearchArgs, join_query};
use crate::output::{SiteResult, format_site_result};

/// Resolve the query on each selected site, one after another, with a
/// single page client.
pub async fn run(config: &AppConfig, args: &SearchArgs) -> Result<()> {
    let sites = select_sites(config, &args.sites)?;

    let query = match join_query(&args.query) {
        Some(q) => q,
        None => prompt_query().await?,
    };

    let policy = if args.bulk {
        FetchPolicy { max_retries: config.max_retries, ..FetchPolicy::bulk() }
    } else {
        FetchPolicy::from_config(config)
    };
    let fetcher = ThrottledFetcher::new(Arc::new(HostThrottle::new()), policy);
    let resolver = Resolver::new(CacheStore::new(&config.cache_path), fetcher);
    let mut client = HttpPageClient::new(&HttpConfig::from(config)).context("building page client")?;

    tracing::info!(query = %query, sites = sites.len(), "starting search");

    let mut results = Vec::with_capacity(sites.len());
    for site in sites {
        if !args.json {
            println!("\nSearching {}...", site.label);
        }
        let found = resolver.resolve(site, &query, &mut client).await;
        if !args.json {
            println!("{}", format_site_result(site.label, found.as_ref()));
        }
        results.push(SiteResult { site: site.name, result: found });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(())
}

/// Profiles for the `--site` names, or for the configured list when none were given.
pub fn select_sites(config: &AppConfig, requested: &[String]) -> Result<Vec<&'static SiteProfile>> {
    let names = if requested.is_empty() { config.sites.as_slice() } else { requested };
    let mut sites = Vec::with_capacity(names.len());
    for name in names {
        let site = SiteProfile::lookup(name)?;
        if !sites.iter().any(|s: &&SiteProfile| s.name == site.name) {
            sites.push(site);
        }
    }
    Ok(sites)
}

async fn prompt_query() -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Product name: ").await?;
    stdout.flush().await?;

    let line = BufReader::new(tokio::io::stdin()).lines().next_line().await?;
    match line.map(|l| l.trim().to_string()) {
        Some(q) if !q.is_empty() => Ok(q),
        _ => bail!("no product name given"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sites_defaults_to_config_order() {
        let config = AppConfig::default();
        let names: Vec<&str> = select_sites(&config, &[]).unwrap().iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["pcgarage", "vexio", "altex", "emag"]);
    }

    #[test]
    fn test_select_sites_requested_and_deduplicated() {
        let config = AppConfig::default();
        let requested = vec!["EMAG".to_string(), "altex".to_string(), "emag".to_string()];
        let names: Vec<&str> = select_sites(&config, &requested).unwrap().iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["emag", "altex"]);
    }

    #[test]
    fn test_select_sites_rejects_unknown() {
        let config = AppConfig { sites: vec!["emag".into(), "amazon".into()], ..Default::default() };
        let err = select_sites(&config, &[]).unwrap_err();
        assert!(err.to_string().contains("amazon"));
    }
}
