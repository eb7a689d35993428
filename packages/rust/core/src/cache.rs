//! In-process result cache and mutation-driven invalidation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use orphanscan_shared::{OrphanResult, OrphanScanError, PageId, Result, ScanCache, ScanConfiguration};
use tracing::debug;

/// A change to site content that makes cached scan results stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentMutation {
    PageSaved(PageId),
    PageDeleted(PageId),
    MetadataChanged { page: PageId, key: String },
    NavigationChanged,
}

/// Drop cached results for both include/exclude variants of `active`.
///
/// Any mutation can change both the inventory and the linked set, so the
/// mutation kind does not narrow what gets cleared.
pub async fn invalidate_for_mutation<C: ScanCache>(
    cache: &C,
    active: &ScanConfiguration,
    mutation: &ContentMutation,
) -> Result<()> {
    for key in active.cache_key_variants() {
        cache.invalidate(&key).await?;
    }
    debug!(?mutation, "cached scan results invalidated");
    Ok(())
}

/// Expiring in-memory [`ScanCache`]. Expired entries are dropped on read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (OrphanResult, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, live or not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (OrphanResult, Instant)>>> {
        self.entries
            .lock()
            .map_err(|_| OrphanScanError::Cache("cache lock poisoned".into()))
    }
}

impl ScanCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<OrphanResult>> {
        let mut entries = self.lock()?;
        let Some((result, expires_at)) = entries.get(key) else {
            return Ok(None);
        };
        if Instant::now() < *expires_at {
            return Ok(Some(result.clone()));
        }
        entries.remove(key);
        Ok(None)
    }

    async fn put(&self, key: &str, value: &OrphanResult, ttl: Duration) -> Result<()> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| OrphanScanError::Cache(format!("cache TTL {ttl:?} out of range")))?;
        self.lock()?
            .insert(key.to_string(), (value.clone(), expires_at));
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
