//! Orphan reconciliation: inventory minus linked URLs.
//!
//! [`find_orphans`] runs a full scan; [`find_orphans_cached`] puts a
//! [`ScanCache`] in front of it, keyed by [`ScanConfiguration::cache_key`].

use std::collections::HashSet;

use orphanscan_links::LinkExtractor;
use orphanscan_shared::{
    ContentStore, NavigationStore, NormalizedUrl, OrphanEntry, OrphanResult, OrphanScanError,
    Result, ScanCache, ScanConfiguration, ScanLimits, SiteIdentity,
};
use tracing::{debug, info, instrument, warn};

use crate::inventory::{Inventory, build_inventory};
use crate::linked::{ScanDeadline, collect_linked_urls};

/// Progress callback for scan phases.
pub trait ScanProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each page's links are collected.
    fn page_scanned(&self, current: usize, total: usize);
    /// Called once with the final result.
    fn done(&self, result: &OrphanResult, from_cache: bool);
}

/// No-op progress reporter.
pub struct SilentProgress;

impl ScanProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_scanned(&self, _current: usize, _total: usize) {}
    fn done(&self, _result: &OrphanResult, _from_cache: bool) {}
}

/// Inventory entries whose URL is not linked, in inventory order.
pub fn orphans_from(inventory: &Inventory, linked: &HashSet<NormalizedUrl>) -> OrphanResult {
    OrphanResult::new(
        inventory
            .iter()
            .filter(|(url, _)| !linked.contains(*url))
            .map(|(url, page_id)| OrphanEntry {
                url: url.clone(),
                page_id,
            })
            .collect(),
    )
}

/// Scan the whole site and return every published page nothing links to.
///
/// The link scan runs under `limits.max_duration`; running out of time fails
/// the whole call with [`OrphanScanError::ScanTimeout`].
#[instrument(skip_all, fields(cache_key = %config.cache_key()))]
pub async fn find_orphans<S>(
    site: &S,
    config: &ScanConfiguration,
    limits: &ScanLimits,
    progress: &dyn ScanProgress,
) -> Result<OrphanResult>
where
    S: ContentStore + NavigationStore + SiteIdentity,
{
    let home_url = site.home_url().await?;
    let extractor = LinkExtractor::new(&home_url, config.protocol_mode)?;

    progress.phase("Building page inventory");
    let inventory = build_inventory(site, config).await?;

    progress.phase("Scanning links");
    let deadline = ScanDeadline::after(limits.max_duration);
    let scan = collect_linked_urls(
        site,
        &extractor,
        config.effective_redirect_key(),
        deadline,
        progress,
    );
    let linked = match tokio::time::timeout(limits.max_duration, scan).await {
        Ok(linked) => linked?,
        Err(_) => {
            warn!(limit_secs = limits.max_duration.as_secs(), "link scan timed out");
            return Err(OrphanScanError::ScanTimeout {
                limit: limits.max_duration,
            });
        }
    };

    let result = orphans_from(&inventory, &linked);
    info!(
        inventory = inventory.len(),
        linked = linked.len(),
        orphans = result.len(),
        "orphan scan complete"
    );
    progress.done(&result, false);
    Ok(result)
}

/// [`find_orphans`] behind a result cache.
///
/// A live cache entry for the configuration is returned as is. Otherwise the
/// site is scanned and the result stored for `limits.cache_ttl`. Cache
/// failures are logged and never fail the scan.
#[instrument(skip_all, fields(cache_key = %config.cache_key()))]
pub async fn find_orphans_cached<S, C>(
    site: &S,
    cache: &C,
    config: &ScanConfiguration,
    limits: &ScanLimits,
    progress: &dyn ScanProgress,
) -> Result<OrphanResult>
where
    S: ContentStore + NavigationStore + SiteIdentity,
    C: ScanCache,
{
    let key = config.cache_key();
    match cache.get(&key).await {
        Ok(Some(hit)) => {
            info!(orphans = hit.len(), "serving cached scan result");
            progress.done(&hit, true);
            return Ok(hit);
        }
        Ok(None) => debug!("no cached scan result"),
        Err(e) => warn!(error = %e, "cache read failed, scanning"),
    }

    let result = find_orphans(site, config, limits, progress).await?;
    if let Err(e) = cache.put(&key, &result, limits.cache_ttl).await {
        warn!(error = %e, "failed to cache scan result");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use orphanscan_shared::{
        NavigationCollection, NavigationEntry, PageId, PageKind, ProtocolMode, SiteSnapshot,
    };

    use super::*;
    use crate::cache::{ContentMutation, MemoryCache, invalidate_for_mutation};
    use crate::memory::{MemorySite, test_record};

    fn url(s: &str) -> NormalizedUrl {
        NormalizedUrl::from_normalized(s)
    }

    fn limits() -> ScanLimits {
        ScanLimits {
            max_duration: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(600),
        }
    }

    /// Home menu links /about/; /about/ links the post; /pricing/ is orphaned.
    fn sample_site() -> MemorySite {
        MemorySite::from_snapshot(SiteSnapshot {
            home_url: "https://example.com".into(),
            pages: vec![
                test_record(
                    10,
                    PageKind::Page,
                    "https://example.com/about/",
                    r#"<p>See <a href="/2024/launch/">our launch</a></p>"#,
                ),
                test_record(11, PageKind::Page, "https://example.com/pricing/", ""),
                test_record(20, PageKind::Post, "https://example.com/2024/launch/", ""),
                test_record(21, PageKind::Post, "https://example.com/2024/quiet/", ""),
            ],
            navigation: vec![NavigationCollection {
                name: "Main".into(),
                entries: vec![NavigationEntry { url: "/about".into(), order: 0 }],
            }],
        })
    }

    fn fixture_site() -> MemorySite {
        let json = include_str!("../../../../fixtures/site/sample.json");
        MemorySite::from_snapshot(SiteSnapshot::from_json(json).expect("fixture parses"))
    }

    #[tokio::test]
    async fn fixture_site_orphans() {
        let site = fixture_site();
        let ids = |r: OrphanResult| r.page_ids().into_iter().map(|id| id.0).collect::<Vec<_>>();

        let all = find_orphans(&site, &ScanConfiguration::default(), &limits(), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(ids(all), vec![4, 6, 8, 10, 13]);

        let secure = ScanConfiguration {
            protocol_mode: ProtocolMode::ForceSecure,
            ..ScanConfiguration::default()
        };
        let result = find_orphans(&site, &secure, &limits(), &SilentProgress).await.unwrap();
        assert_eq!(ids(result), vec![4, 6, 10, 13]);

        let pages_only = ScanConfiguration {
            include_listable: false,
            ..ScanConfiguration::default()
        };
        let result = find_orphans(&site, &pages_only, &limits(), &SilentProgress).await.unwrap();
        assert_eq!(ids(result), vec![4, 6, 8]);
    }

    #[test]
    fn difference_keeps_inventory_order() {
        let inventory: Inventory = [
            (url("https://s/a/"), PageId(1)),
            (url("https://s/b/"), PageId(2)),
            (url("https://s/c/"), PageId(3)),
        ]
        .into_iter()
        .collect();
        let linked: HashSet<_> = [url("https://s/a/"), url("https://s/c/")].into_iter().collect();

        let result = orphans_from(&inventory, &linked);
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("https://s/b/"), Some(PageId(2)));
    }

    #[test]
    fn links_outside_inventory_are_irrelevant() {
        let inventory: Inventory = [(url("https://s/a/"), PageId(1)), (url("https://s/b/"), PageId(2))]
            .into_iter()
            .collect();
        let linked: HashSet<_> = [url("https://s/zzz/")].into_iter().collect();
        assert_eq!(orphans_from(&inventory, &linked).page_ids(), vec![PageId(1), PageId(2)]);
    }

    #[tokio::test]
    async fn finds_unlinked_pages_and_posts() {
        let site = sample_site();
        let result = find_orphans(&site, &ScanConfiguration::default(), &limits(), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(result.page_ids(), vec![PageId(11), PageId(21)]);
        assert_eq!(result.get("https://example.com/pricing/"), Some(PageId(11)));
    }

    #[tokio::test]
    async fn excluding_posts_limits_the_inventory_not_the_links() {
        let site = sample_site();
        let config = ScanConfiguration {
            include_listable: false,
            ..ScanConfiguration::default()
        };
        let result = find_orphans(&site, &config, &limits(), &SilentProgress).await.unwrap();
        assert_eq!(result.page_ids(), vec![PageId(11)]);
    }

    #[tokio::test]
    async fn redirect_field_counts_as_link() {
        let mut site = sample_site();
        site.set_metadata(PageId(10), "moved_to", "https://example.com/pricing");

        let default_key = find_orphans(&site, &ScanConfiguration::default(), &limits(), &SilentProgress)
            .await
            .unwrap();
        assert!(default_key.get("https://example.com/pricing/").is_some());

        let config = ScanConfiguration {
            redirect_key: "moved_to".into(),
            ..ScanConfiguration::default()
        };
        let result = find_orphans(&site, &config, &limits(), &SilentProgress).await.unwrap();
        assert!(result.get("https://example.com/pricing/").is_none());
    }

    #[tokio::test]
    async fn protocol_mode_matches_insecure_links() {
        let mut site = sample_site();
        site.upsert_page(test_record(
            12,
            PageKind::Page,
            "https://example.com/legal/",
            r#"<a href="http://example.com/pricing/">prices</a>"#,
        ));
        let config = ScanConfiguration {
            include_listable: false,
            ..ScanConfiguration::default()
        };

        let plain = find_orphans(&site, &config, &limits(), &SilentProgress).await.unwrap();
        assert!(plain.get("https://example.com/pricing/").is_some());

        let forced = ScanConfiguration {
            protocol_mode: ProtocolMode::ForceSecure,
            ..config
        };
        let result = find_orphans(&site, &forced, &limits(), &SilentProgress).await.unwrap();
        assert!(result.get("https://example.com/pricing/").is_none());
        assert!(result.get("https://example.com/legal/").is_some());
    }

    #[tokio::test]
    async fn orphan_iff_unlinked() {
        let site = sample_site();
        let config = ScanConfiguration::default();
        let extractor = LinkExtractor::new("https://example.com", config.protocol_mode).unwrap();
        let inventory = build_inventory(&site, &config).await.unwrap();
        let linked = collect_linked_urls(
            &site,
            &extractor,
            config.effective_redirect_key(),
            ScanDeadline::after(Duration::from_secs(30)),
            &SilentProgress,
        )
        .await
        .unwrap();

        let result = find_orphans(&site, &config, &limits(), &SilentProgress).await.unwrap();
        for (url, id) in inventory.iter() {
            assert_eq!(result.get(url.as_str()) == Some(id), !linked.contains(url), "{url}");
        }
    }

    #[tokio::test]
    async fn timeout_is_fatal_and_not_cached() {
        let site = sample_site();
        let cache = MemoryCache::new();
        let limits = ScanLimits {
            max_duration: Duration::ZERO,
            cache_ttl: Duration::from_secs(600),
        };

        let err = find_orphans_cached(&site, &cache, &ScanConfiguration::default(), &limits, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, OrphanScanError::ScanTimeout { .. }));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn missing_home_url_fails() {
        let site = MemorySite::new("");
        let err = find_orphans(&site, &ScanConfiguration::default(), &limits(), &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, OrphanScanError::Validation { .. }));
    }

    #[tokio::test]
    async fn cached_results_are_identical_until_invalidated() {
        let mut site = sample_site();
        let cache = MemoryCache::new();
        let config = ScanConfiguration::default();

        let first = find_orphans_cached(&site, &cache, &config, &limits(), &SilentProgress)
            .await
            .unwrap();
        let second = find_orphans_cached(&site, &cache, &config, &limits(), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );

        // Link the pricing page from the menu; without invalidation the stale
        // result is still served.
        let mutation = site.set_navigation(vec![NavigationCollection {
            name: "Main".into(),
            entries: vec![
                NavigationEntry { url: "/about".into(), order: 0 },
                NavigationEntry { url: "/pricing".into(), order: 1 },
            ],
        }]);
        let stale = find_orphans_cached(&site, &cache, &config, &limits(), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(stale, first);

        invalidate_for_mutation(&cache, &config, &mutation).await.unwrap();
        let fresh = find_orphans_cached(&site, &cache, &config, &limits(), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(fresh.page_ids(), vec![PageId(21)]);
    }

    #[tokio::test]
    async fn configuration_change_uses_a_different_entry() {
        let site = sample_site();
        let cache = MemoryCache::new();
        let all = ScanConfiguration::default();
        let pages_only = ScanConfiguration {
            include_listable: false,
            ..ScanConfiguration::default()
        };

        let a = find_orphans_cached(&site, &cache, &all, &limits(), &SilentProgress).await.unwrap();
        let b = find_orphans_cached(&site, &cache, &pages_only, &limits(), &SilentProgress)
            .await
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(cache.len(), 2);

        let mutation = ContentMutation::PageDeleted(PageId(21));
        invalidate_for_mutation(&cache, &all, &mutation).await.unwrap();
        assert!(cache.is_empty());
    }
}
