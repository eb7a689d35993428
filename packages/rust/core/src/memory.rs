//! In-process site backed by a [`SiteSnapshot`].
//!
//! Implements every read-side collaborator trait so scans can run without a
//! database, e.g. straight from a snapshot file or in tests.

use orphanscan_shared::{
    ContentStore, NavigationCollection, NavigationStore, Page, PageId, PageKind, PageRecord,
    PublishStatus, Result, SiteIdentity, SiteSnapshot,
};

use crate::cache::ContentMutation;

/// A whole site held in memory. Pages are enumerated in snapshot order.
#[derive(Debug, Clone, Default)]
pub struct MemorySite {
    home_url: String,
    pages: Vec<PageRecord>,
    navigation: Vec<NavigationCollection>,
}

impl MemorySite {
    pub fn new(home_url: impl Into<String>) -> Self {
        Self {
            home_url: home_url.into(),
            ..Self::default()
        }
    }

    pub fn from_snapshot(snapshot: SiteSnapshot) -> Self {
        Self {
            home_url: snapshot.home_url,
            pages: snapshot.pages,
            navigation: snapshot.navigation,
        }
    }

    fn record(&self, id: PageId) -> Option<&PageRecord> {
        self.pages.iter().find(|r| r.page.id == id)
    }

    fn record_mut(&mut self, id: PageId) -> Option<&mut PageRecord> {
        self.pages.iter_mut().find(|r| r.page.id == id)
    }

    /// Insert or replace a page by id. New pages are appended.
    pub fn upsert_page(&mut self, record: PageRecord) -> ContentMutation {
        let id = record.page.id;
        match self.record_mut(id) {
            Some(existing) => *existing = record,
            None => self.pages.push(record),
        }
        ContentMutation::PageSaved(id)
    }

    pub fn remove_page(&mut self, id: PageId) -> ContentMutation {
        self.pages.retain(|r| r.page.id != id);
        ContentMutation::PageDeleted(id)
    }

    /// Set a custom field. Unknown pages are ignored.
    pub fn set_metadata(&mut self, id: PageId, key: &str, value: &str) -> ContentMutation {
        if let Some(record) = self.record_mut(id) {
            record.meta.insert(key.to_string(), value.to_string());
        }
        ContentMutation::MetadataChanged {
            page: id,
            key: key.to_string(),
        }
    }

    pub fn set_status(&mut self, id: PageId, status: PublishStatus) -> ContentMutation {
        if let Some(record) = self.record_mut(id) {
            record.page.status = status;
        }
        ContentMutation::PageSaved(id)
    }

    pub fn set_navigation(&mut self, navigation: Vec<NavigationCollection>) -> ContentMutation {
        self.navigation = navigation;
        ContentMutation::NavigationChanged
    }
}

impl ContentStore for MemorySite {
    async fn list_published_pages(&self, kinds: &[PageKind]) -> Result<Vec<Page>> {
        Ok(self
            .pages
            .iter()
            .filter(|r| r.page.is_published() && kinds.contains(&r.page.kind))
            .map(|r| r.page.clone())
            .collect())
    }

    async fn get_page(&self, id: PageId) -> Result<Option<Page>> {
        Ok(self.record(id).map(|r| r.page.clone()))
    }

    async fn metadata_field(&self, id: PageId, key: &str) -> Result<Option<String>> {
        Ok(self.record(id).and_then(|r| r.meta.get(key).cloned()))
    }

    async fn canonical_url(&self, id: PageId) -> Result<Option<String>> {
        Ok(self.record(id).map(|r| r.permalink.clone()))
    }
}

impl NavigationStore for MemorySite {
    async fn list_navigation_collections(&self) -> Result<Vec<NavigationCollection>> {
        Ok(self.navigation.clone())
    }
}

impl SiteIdentity for MemorySite {
    async fn home_url(&self) -> Result<String> {
        Ok(self.home_url.clone())
    }
}

/// A published page record with fixed dates, for tests.
#[cfg(test)]
pub(crate) fn test_record(id: u64, kind: PageKind, permalink: &str, content: &str) -> PageRecord {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};

    let published = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    PageRecord {
        page: Page {
            id: PageId(id),
            kind,
            status: PublishStatus::Publish,
            title: format!("Page {id}"),
            content: content.to_string(),
            author: Some("Ada".into()),
            published_at: published,
            modified_at: published,
            categories: Vec::new(),
            tags: Vec::new(),
        },
        permalink: permalink.to_string(),
        meta: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use orphanscan_shared::NavigationEntry;

    use super::*;

    #[tokio::test]
    async fn reads_follow_snapshot() {
        let mut site = MemorySite::new("https://example.com");
        site.upsert_page(test_record(1, PageKind::Page, "https://example.com/a/", "body"));
        site.upsert_page(test_record(2, PageKind::Post, "https://example.com/b/", ""));
        site.set_metadata(PageId(1), "redirect_url", "/b/");

        assert_eq!(site.home_url().await.unwrap(), "https://example.com");
        assert_eq!(site.list_published_pages(&[PageKind::Post]).await.unwrap().len(), 1);
        assert_eq!(
            site.metadata_field(PageId(1), "redirect_url").await.unwrap().as_deref(),
            Some("/b/")
        );
        assert_eq!(
            site.canonical_url(PageId(2)).await.unwrap().as_deref(),
            Some("https://example.com/b/")
        );
    }

    #[tokio::test]
    async fn mutations_report_what_changed() {
        let mut site = MemorySite::new("https://example.com");
        let saved = site.upsert_page(test_record(1, PageKind::Page, "https://example.com/a/", ""));
        assert_eq!(saved, ContentMutation::PageSaved(PageId(1)));

        let nav = site.set_navigation(vec![NavigationCollection {
            name: "Main".into(),
            entries: vec![NavigationEntry { url: "/a/".into(), order: 0 }],
        }]);
        assert_eq!(nav, ContentMutation::NavigationChanged);
        assert_eq!(site.list_navigation_collections().await.unwrap().len(), 1);

        site.set_status(PageId(1), PublishStatus::Draft);
        assert!(site.list_published_pages(&PageKind::ALL).await.unwrap().is_empty());
        assert!(site.get_page(PageId(1)).await.unwrap().is_some());

        assert_eq!(site.remove_page(PageId(1)), ContentMutation::PageDeleted(PageId(1)));
        assert!(site.get_page(PageId(1)).await.unwrap().is_none());
    }
}
