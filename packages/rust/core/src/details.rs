//! Display details for orphan entries, joined from the content store.

use orphanscan_shared::{ContentStore, OrphanEntry, OrphanResult, PageId, Result};
use serde::Serialize;
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
const NOT_AVAILABLE: &str = "N/A";

/// One row of the orphan report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDetails {
    pub id: PageId,
    #[serde(rename = "type")]
    pub type_label: String,
    pub url: String,
    pub title: String,
    pub published: String,
    pub modified: String,
    pub categories: String,
    pub tags: String,
    pub author: String,
}

impl PageDetails {
    /// Placeholder for a page that no longer exists.
    pub fn deleted(id: PageId, url: &str) -> Self {
        Self {
            id,
            type_label: "Deleted".into(),
            url: url.to_string(),
            title: "Page Not Found".into(),
            published: NOT_AVAILABLE.into(),
            modified: NOT_AVAILABLE.into(),
            categories: String::new(),
            tags: String::new(),
            author: NOT_AVAILABLE.into(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.type_label == "Deleted"
    }
}

/// Details for one orphan entry. A page missing from the store yields the
/// [`PageDetails::deleted`] record instead of an error.
pub async fn page_details<S: ContentStore>(store: &S, entry: &OrphanEntry) -> Result<PageDetails> {
    let Some(page) = store.get_page(entry.page_id).await? else {
        warn!(id = %entry.page_id, url = %entry.url, "orphan refers to a page that no longer exists");
        return Ok(PageDetails::deleted(entry.page_id, entry.url.as_str()));
    };

    Ok(PageDetails {
        id: page.id,
        type_label: page.kind.label().to_string(),
        url: entry.url.to_string(),
        title: page.title,
        published: page.published_at.format(DATE_FORMAT).to_string(),
        modified: page.modified_at.format(DATE_FORMAT).to_string(),
        categories: page.categories.join(", "),
        tags: page.tags.join(", "),
        author: page.author.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    })
}

/// Details for a slice of entries, in order.
pub async fn details_for<'a, S, I>(store: &S, entries: I) -> Result<Vec<PageDetails>>
where
    S: ContentStore,
    I: IntoIterator<Item = &'a OrphanEntry>,
{
    let mut rows = Vec::new();
    for entry in entries {
        rows.push(page_details(store, entry).await?);
    }
    Ok(rows)
}

/// Details for every entry of a result.
pub async fn report<S: ContentStore>(store: &S, result: &OrphanResult) -> Result<Vec<PageDetails>> {
    details_for(store, result.iter()).await
}

#[cfg(test)]
mod tests {
    use orphanscan_shared::{NormalizedUrl, PageKind};

    use super::*;
    use crate::memory::{MemorySite, test_record};

    fn entry(id: u64, url: &str) -> OrphanEntry {
        OrphanEntry {
            url: NormalizedUrl::from_normalized(url),
            page_id: PageId(id),
        }
    }

    #[tokio::test]
    async fn formats_existing_page() {
        let mut site = MemorySite::new("https://example.com");
        let mut record = test_record(5, PageKind::Post, "https://example.com/p/", "");
        record.page.categories = vec!["News".into(), "Updates".into()];
        record.page.tags = vec!["launch".into()];
        site.upsert_page(record);

        let details = page_details(&site, &entry(5, "https://example.com/p/")).await.unwrap();
        assert_eq!(details.type_label, "Post");
        assert_eq!(details.title, "Page 5");
        assert_eq!(details.published, "2024-03-01 12:30");
        assert_eq!(details.categories, "News, Updates");
        assert_eq!(details.tags, "launch");
        assert_eq!(details.author, "Ada");
        assert!(!details.is_deleted());
    }

    #[tokio::test]
    async fn dangling_id_degrades() {
        let site = MemorySite::new("https://example.com");
        let details = page_details(&site, &entry(99, "https://example.com/gone/")).await.unwrap();
        assert!(details.is_deleted());
        assert_eq!(details.title, "Page Not Found");
        assert_eq!(details.published, "N/A");
        assert_eq!(details.url, "https://example.com/gone/");
    }

    #[tokio::test]
    async fn report_survives_deleted_pages() {
        let mut site = MemorySite::new("https://example.com");
        site.upsert_page(test_record(1, PageKind::Page, "https://example.com/a/", ""));
        let result = OrphanResult::new(vec![
            entry(1, "https://example.com/a/"),
            entry(2, "https://example.com/b/"),
        ]);

        let rows = report(&site, &result).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].type_label, "Page");
        assert!(rows[1].is_deleted());
    }
}
