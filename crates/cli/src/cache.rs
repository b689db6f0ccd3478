use anyhow::Result;
use pricescout_client::SiteProfile;
use pricescout_core::{AppConfig, CacheStore, ResolvedEntry};

use crate::cli::{CacheCommand, join_query};
use crate::output::format_entry;

pub async fn run(config: &AppConfig, cmd: CacheCommand) -> Result<()> {
    let cache = CacheStore::new(&config.cache_path);

    match cmd {
        CacheCommand::Sites => {
            for site in cache.sites().await? {
                println!("{site}");
            }
        }
        CacheCommand::List { site, json } => {
            let entries = cache.load(&site).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No cached entries for {site}.");
            } else {
                for entry in &entries {
                    println!("{}\n", format_entry(entry));
                }
            }
        }
        CacheCommand::Lookup { site, query, fuzzy } => {
            let query = join_query(&query).unwrap_or_default();
            match lookup(&cache, &site, &query, fuzzy).await? {
                Some(entry) => println!("{}", format_entry(&entry)),
                None => println!("Not cached."),
            }
        }
    }

    Ok(())
}

/// Exact query-index lookup, then fuzzy title matching with the site's scorer
/// when `fuzzy` is set.
pub async fn lookup(cache: &CacheStore, site: &str, query: &str, fuzzy: bool) -> Result<Option<ResolvedEntry>> {
    if let Some(hit) = cache.get_for_query(site, query).await? {
        return Ok(Some(hit));
    }
    if !fuzzy {
        return Ok(None);
    }

    let scorer = SiteProfile::by_name(site).map(|p| p.scorer).unwrap_or_default();
    Ok(cache.find_best(site, query, &scorer).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricescout_core::EntryPatch;

    fn patch(title: &str, url: &str) -> EntryPatch {
        EntryPatch { title: Some(title.into()), price: Some(100.0), url: Some(url.into()), specs: None }
    }

    #[tokio::test]
    async fn test_lookup_exact_then_fuzzy() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::new(dir.path().join("cache.json"));
        cache
            .upsert_for_query("emag", "mouse logitech", patch("Mouse Logitech G502 Hero", "https://e.ro/m"))
            .await
            .unwrap();
        cache.upsert("emag", patch("Tastatura Logitech G915", "https://e.ro/k")).await.unwrap();

        let exact = lookup(&cache, "emag", "Mouse  Logitech", false).await.unwrap().unwrap();
        assert_eq!(exact.url.as_deref(), Some("https://e.ro/m"));

        assert!(lookup(&cache, "emag", "tastatura logitech g915", false).await.unwrap().is_none());
        let fuzzy = lookup(&cache, "emag", "tastatura logitech g915", true).await.unwrap().unwrap();
        assert_eq!(fuzzy.url.as_deref(), Some("https://e.ro/k"));

        assert!(lookup(&cache, "emag", "frigider", true).await.unwrap().is_none());
    }
}
