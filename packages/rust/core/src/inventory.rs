//! Page inventory: normalized canonical URL → page id.

use std::collections::HashMap;

use orphanscan_links::normalize;
use orphanscan_shared::{ContentStore, NormalizedUrl, PageId, Result, ScanConfiguration};
use tracing::{debug, info, instrument, warn};

/// Two pages whose canonical URLs normalize to the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryCollision {
    pub url: NormalizedUrl,
    /// Page that held the key before.
    pub replaced: PageId,
    /// Page that now holds it.
    pub winner: PageId,
}

/// Insertion-ordered map of normalized URL to page.
///
/// A later insert for an existing key overwrites its page (last write wins)
/// but keeps the key's original position. Every overwrite is also recorded in
/// [`Inventory::collisions`].
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    entries: Vec<(NormalizedUrl, PageId)>,
    index: HashMap<NormalizedUrl, usize>,
    collisions: Vec<InventoryCollision>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `url` to `id`. Returns the page previously mapped to `url`, if any.
    pub fn insert(&mut self, url: NormalizedUrl, id: PageId) -> Option<PageId> {
        if let Some(&pos) = self.index.get(&url) {
            let previous = std::mem::replace(&mut self.entries[pos].1, id);
            if previous != id {
                self.collisions.push(InventoryCollision {
                    url,
                    replaced: previous,
                    winner: id,
                });
            }
            return Some(previous);
        }

        self.index.insert(url.clone(), self.entries.len());
        self.entries.push((url, id));
        None
    }

    pub fn get(&self, url: &str) -> Option<PageId> {
        self.index.get(url).map(|&pos| self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&NormalizedUrl, PageId)> {
        self.entries.iter().map(|(url, id)| (url, *id))
    }

    pub fn collisions(&self) -> &[InventoryCollision] {
        &self.collisions
    }
}

impl FromIterator<(NormalizedUrl, PageId)> for Inventory {
    fn from_iter<T: IntoIterator<Item = (NormalizedUrl, PageId)>>(iter: T) -> Self {
        let mut inventory = Inventory::new();
        for (url, id) in iter {
            inventory.insert(url, id);
        }
        inventory
    }
}

/// Map every published page of the selected kinds to its normalized canonical URL.
///
/// Structural pages are always included; listable pages only when
/// `config.include_listable` is set. Pages whose canonical URL cannot be normalized
/// are left out, since they cannot be compared against links.
#[instrument(
    skip_all,
    fields(include_listable = config.include_listable, protocol_mode = %config.protocol_mode)
)]
pub async fn build_inventory<S: ContentStore>(
    store: &S,
    config: &ScanConfiguration,
) -> Result<Inventory> {
    let mode = config.protocol_mode;
    let pages = store.list_published_pages(config.inventory_kinds()).await?;
    let mut inventory = Inventory::new();
    let mut skipped = 0usize;

    for page in &pages {
        let Some(permalink) = store.canonical_url(page.id).await? else {
            skipped += 1;
            continue;
        };
        match normalize(&permalink, mode) {
            Some(url) => {
                inventory.insert(url, page.id);
            }
            None => {
                debug!(id = %page.id, %permalink, "canonical URL cannot be normalized, skipping");
                skipped += 1;
            }
        }
    }

    for collision in inventory.collisions() {
        warn!(
            url = %collision.url,
            replaced = %collision.replaced,
            winner = %collision.winner,
            "two pages share a normalized URL"
        );
    }

    info!(
        pages = pages.len(),
        entries = inventory.len(),
        skipped,
        collisions = inventory.collisions().len(),
        "inventory built"
    );
    Ok(inventory)
}
