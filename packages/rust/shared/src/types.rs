//! Core domain types for orphan page detection.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OrphanScanError;

/// Metadata key consulted for redirect targets when none is configured.
pub const DEFAULT_REDIRECT_KEY: &str = "redirect_url";

// ---------------------------------------------------------------------------
// PageId
// ---------------------------------------------------------------------------

/// Stable identifier of a page in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub u64);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// The two publishable content classifications.
///
/// `Post` is the listable kind (dated, feed-style entries); `Page` is the
/// structural kind (standalone site pages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Post,
    Page,
}

impl PageKind {
    /// Both kinds, in scan order.
    pub const ALL: [PageKind; 2] = [PageKind::Post, PageKind::Page];

    /// Human-readable singular label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Post => "Post",
            Self::Page => "Page",
        }
    }

    /// Storage identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
        }
    }
}

impl std::str::FromStr for PageKind {
    type Err = OrphanScanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "post" => Ok(Self::Post),
            "page" => Ok(Self::Page),
            other => Err(OrphanScanError::parse(format!("unknown page kind '{other}'"))),
        }
    }
}

/// Publication status. Only [`PublishStatus::Publish`] pages take part in a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    #[default]
    Publish,
    Draft,
    Pending,
    Private,
    Trash,
}

impl PublishStatus {
    /// Storage identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Private => "private",
            Self::Trash => "trash",
        }
    }
}

impl std::str::FromStr for PublishStatus {
    type Err = OrphanScanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "publish" => Ok(Self::Publish),
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "private" => Ok(Self::Private),
            "trash" => Ok(Self::Trash),
            other => Err(OrphanScanError::parse(format!("unknown publish status '{other}'"))),
        }
    }
}

/// A page as read from the content store.
///
/// The canonical URL is not part of the page; stores derive it on request
/// (see [`crate::store::ContentStore::canonical_url`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Stable identifier.
    pub id: PageId,
    /// Listable vs structural classification.
    pub kind: PageKind,
    /// Publication status.
    #[serde(default)]
    pub status: PublishStatus,
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Raw markup body.
    #[serde(default)]
    pub content: String,
    /// Display name of the author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// First publication time.
    pub published_at: DateTime<Utc>,
    /// Last modification time.
    pub modified_at: DateTime<Utc>,
    /// Category names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Tag names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Page {
    /// Whether the page participates in orphan detection at all.
    pub fn is_published(&self) -> bool {
        self.status == PublishStatus::Publish
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// A single menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEntry {
    /// Raw target URL, possibly relative.
    pub url: String,
    /// Display order within the collection.
    #[serde(default)]
    pub order: u32,
}

/// A named menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationCollection {
    /// Menu name.
    pub name: String,
    /// Entries in display order.
    #[serde(default)]
    pub entries: Vec<NavigationEntry>,
}

// ---------------------------------------------------------------------------
// ProtocolMode / ScanConfiguration
// ---------------------------------------------------------------------------

/// How URL schemes are unified before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProtocolMode {
    /// Leave schemes untouched.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Rewrite `http:` to `https:`.
    #[serde(rename = "to_https")]
    ForceSecure,
    /// Rewrite `https:` to `http:`.
    #[serde(rename = "to_http")]
    ForceInsecure,
}

impl ProtocolMode {
    /// Settings/cache-key identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ForceSecure => "to_https",
            Self::ForceInsecure => "to_http",
        }
    }
}

impl std::fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProtocolMode {
    type Err = OrphanScanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" | "" => Ok(Self::None),
            "to_https" | "https" => Ok(Self::ForceSecure),
            "to_http" | "http" => Ok(Self::ForceInsecure),
            other => Err(OrphanScanError::config(format!(
                "unknown protocol mode '{other}': expected none, to_https or to_http"
            ))),
        }
    }
}

/// Everything that shapes the outcome of one scan.
///
/// Cached results are keyed by this value; see [`ScanConfiguration::cache_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanConfiguration {
    /// Include listable pages (posts) in the inventory. `false` means "exclude posts".
    pub include_listable: bool,
    /// Metadata key holding a redirect target.
    pub redirect_key: String,
    /// Scheme unification mode.
    pub protocol_mode: ProtocolMode,
}

impl Default for ScanConfiguration {
    fn default() -> Self {
        Self {
            include_listable: true,
            redirect_key: DEFAULT_REDIRECT_KEY.into(),
            protocol_mode: ProtocolMode::None,
        }
    }
}

impl ScanConfiguration {
    /// The redirect key to read, falling back to [`DEFAULT_REDIRECT_KEY`] when empty.
    pub fn effective_redirect_key(&self) -> &str {
        let key = self.redirect_key.trim();
        if key.is_empty() { DEFAULT_REDIRECT_KEY } else { key }
    }

    /// Kinds that make up the inventory for this configuration.
    pub fn inventory_kinds(&self) -> &'static [PageKind] {
        if self.include_listable {
            &PageKind::ALL
        } else {
            &[PageKind::Page]
        }
    }

    /// Deterministic cache key, e.g. `orphans_all_redirect_url_none`.
    ///
    /// Built from [`Self::effective_redirect_key`], so a blank key and the
    /// default key share one cache entry.
    pub fn cache_key(&self) -> String {
        let scope = if self.include_listable { "all" } else { "pages_only" };
        let redirect = sanitize_key(self.effective_redirect_key());
        format!("orphans_{scope}_{redirect}_{}", self.protocol_mode)
    }

    /// Keys for both include/exclude variants of this configuration.
    ///
    /// Either variant may be cached, so invalidation clears both.
    pub fn cache_key_variants(&self) -> [String; 2] {
        let mut all = self.clone();
        all.include_listable = true;
        let mut pages_only = self.clone();
        pages_only.include_listable = false;
        [all.cache_key(), pages_only.cache_key()]
    }
}

/// Lowercase and keep only `[a-z0-9_-]`.
fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

// ---------------------------------------------------------------------------
// NormalizedUrl
// ---------------------------------------------------------------------------

/// A URL in canonical comparison form: `scheme://host/path`, no port, query or
/// fragment, decoded path, extension-less paths slash-terminated.
///
/// Values are produced by the normalizer in `orphanscan-links`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    /// Wrap a string that is already in normalized form.
    pub fn from_normalized(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this URL falls under `prefix` (used for the internal-link test).
    pub fn starts_with(&self, prefix: &NormalizedUrl) -> bool {
        self.0.starts_with(prefix.as_str())
    }
}

impl std::fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NormalizedUrl {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for NormalizedUrl {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ---------------------------------------------------------------------------
// OrphanResult
// ---------------------------------------------------------------------------

/// One orphan: its normalized URL and the page it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanEntry {
    pub url: NormalizedUrl,
    pub page_id: PageId,
}

/// Ordered, immutable orphan mapping produced by one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrphanResult {
    entries: Vec<OrphanEntry>,
}

impl OrphanResult {
    /// Build from entries already in result order.
    pub fn new(entries: Vec<OrphanEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrphanEntry> {
        self.entries.iter()
    }

    /// Look up the page behind an orphan URL.
    pub fn get(&self, url: &str) -> Option<PageId> {
        self.entries
            .iter()
            .find(|e| e.url.as_str() == url)
            .map(|e| e.page_id)
    }

    pub fn page_ids(&self) -> Vec<PageId> {
        self.entries.iter().map(|e| e.page_id).collect()
    }

    /// One page of results (1-based `page`), as the admin table shows them.
    pub fn paginate(&self, page: usize, per_page: usize) -> &[OrphanEntry] {
        if per_page == 0 {
            return &[];
        }
        let start = page.saturating_sub(1).saturating_mul(per_page);
        if start >= self.entries.len() {
            return &[];
        }
        let end = (start + per_page).min(self.entries.len());
        &self.entries[start..end]
    }

    /// Number of pages at `per_page` entries each.
    pub fn page_count(&self, per_page: usize) -> usize {
        if per_page == 0 {
            0
        } else {
            self.entries.len().div_ceil(per_page)
        }
    }
}

// ---------------------------------------------------------------------------
// SiteSnapshot
// ---------------------------------------------------------------------------

/// A page plus its store-derived attributes, as exchanged in snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(flatten)]
    pub page: Page,
    /// Public URL of the page.
    pub permalink: String,
    /// Custom metadata fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

/// Whole-site content dump used for import and in-memory scans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteSnapshot {
    /// Site root URL.
    pub home_url: String,
    #[serde(default)]
    pub pages: Vec<PageRecord>,
    #[serde(default)]
    pub navigation: Vec<NavigationCollection>,
}

impl SiteSnapshot {
    /// Parse a snapshot from JSON text.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| OrphanScanError::parse(format!("invalid site snapshot: {e}")))
    }
}
