//! Linked-URL collection across page bodies, redirect fields and menus.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use orphanscan_links::LinkExtractor;
use orphanscan_shared::{
    ContentStore, NavigationStore, NormalizedUrl, OrphanScanError, PageKind, Result,
};
use tracing::{debug, info, instrument};

use crate::reconcile::ScanProgress;

/// Wall-clock budget for the link scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanDeadline {
    expires_at: Option<Instant>,
    limit: Duration,
}

impl ScanDeadline {
    /// A deadline `limit` from now.
    pub fn after(limit: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(limit),
            limit,
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Fails with [`OrphanScanError::ScanTimeout`] once the budget is spent.
    pub fn check(&self) -> Result<()> {
        if self.expires_at.is_some_and(|at| Instant::now() >= at) {
            return Err(OrphanScanError::ScanTimeout { limit: self.limit });
        }
        Ok(())
    }
}

/// Every internal URL referenced anywhere on the site.
///
/// Scans the body and redirect field of every published post and page
/// (regardless of which kinds the inventory holds), then every navigation
/// entry. Relative references in a body resolve against that page's canonical
/// URL, falling back to the home URL.
#[instrument(skip_all, fields(redirect_key = redirect_key, home = %extractor.home()))]
pub async fn collect_linked_urls<S>(
    site: &S,
    extractor: &LinkExtractor,
    redirect_key: &str,
    deadline: ScanDeadline,
    progress: &dyn ScanProgress,
) -> Result<HashSet<NormalizedUrl>>
where
    S: ContentStore + NavigationStore,
{
    let pages = site.list_published_pages(&PageKind::ALL).await?;
    let total = pages.len();
    let home = extractor.home().to_string();

    let mut linked = HashSet::new();
    let mut redirects = 0usize;

    for (i, page) in pages.iter().enumerate() {
        deadline.check()?;

        let base = site
            .canonical_url(page.id)
            .await?
            .unwrap_or_else(|| home.clone());

        let body = extractor.body_links(&page.content, &base);
        debug!(id = %page.id, links = body.len(), "page scanned");
        linked.extend(body);

        let redirect = site.metadata_field(page.id, redirect_key).await?;
        if let Some(target) = redirect.and_then(|v| extractor.redirect_link(v.trim(), &base)) {
            debug!(id = %page.id, %target, "redirect target counted as link");
            linked.insert(target);
            redirects += 1;
        }

        progress.page_scanned(i + 1, total);
    }

    deadline.check()?;
    let mut menu_links = 0usize;
    for collection in site.list_navigation_collections().await? {
        for entry in &collection.entries {
            if let Some(target) = extractor.navigation_link(&entry.url) {
                linked.insert(target);
                menu_links += 1;
            }
        }
    }

    info!(
        pages = total,
        redirects,
        menu_links,
        linked = linked.len(),
        "link scan complete"
    );
    Ok(linked)
}
