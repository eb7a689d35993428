//! Collaborator interfaces the scanner reads from.
//!
//! The content store, navigation store, site identity and result cache are
//! owned by the surrounding application. The scanner only reads through these
//! traits (and writes to the cache). Implementations: `orphanscan-storage`
//! (libSQL) and the in-memory types in `orphanscan-core`.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use crate::error::Result;
use crate::types::{NavigationCollection, OrphanResult, Page, PageId, PageKind};

/// Read access to pages and their metadata.
pub trait ContentStore {
    /// All published pages whose kind is in `kinds`, in the store's natural order.
    async fn list_published_pages(&self, kinds: &[PageKind]) -> Result<Vec<Page>>;

    /// A page by id, regardless of status. `None` if it no longer exists.
    async fn get_page(&self, id: PageId) -> Result<Option<Page>>;

    /// A single metadata field of a page.
    async fn metadata_field(&self, id: PageId, key: &str) -> Result<Option<String>>;

    /// Public URL of a page, or `None` if the page does not exist.
    async fn canonical_url(&self, id: PageId) -> Result<Option<String>>;
}

/// Read access to menus.
pub trait NavigationStore {
    async fn list_navigation_collections(&self) -> Result<Vec<NavigationCollection>>;
}

/// Identity of the site being scanned.
pub trait SiteIdentity {
    /// Site root URL; decides internal vs external links and anchors resolution.
    async fn home_url(&self) -> Result<String>;
}

/// Result cache keyed by [`crate::ScanConfiguration::cache_key`].
pub trait ScanCache {
    /// A live entry, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<OrphanResult>>;

    /// Store `value` under `key` for `ttl`. Last writer wins.
    async fn put(&self, key: &str, value: &OrphanResult, ttl: Duration) -> Result<()>;

    /// Drop the entry for `key` if present.
    async fn invalidate(&self, key: &str) -> Result<()>;
}
