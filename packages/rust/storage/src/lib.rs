//! Turso Embedded / libSQL storage layer (offline mode).
//!
//! The [`Storage`] struct wraps a libSQL database holding the site being
//! scanned: pages with their terms and custom fields, navigation menus, site
//! settings, and cached orphan scan results. It implements every collaborator
//! trait from `orphanscan-shared`.
//!
//! **Access rules:**
//! - `orphanscan scan`, `import`, `draft`: read-write via [`Storage::open`]
//! - inspection tooling: read-only via [`Storage::open_readonly`]
//!
//! Every content, metadata or menu mutation clears the cached results of the
//! active scan configuration.

mod migrations;

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, Row, Transaction, params};
use orphanscan_shared::{
    ContentStore, NavigationCollection, NavigationEntry, NavigationStore, OrphanResult,
    OrphanScanError, Page, PageId, PageKind, PageRecord, ProtocolMode, PublishStatus, Result,
    ScanCache, ScanConfiguration, SiteIdentity, SiteSnapshot,
};
use tracing::{debug, info, warn};

const SETTING_HOME_URL: &str = "home_url";
const SETTING_REDIRECT_KEY: &str = "redirect_key";
const SETTING_PROTOCOL_MODE: &str = "protocol_mode";

const TAXONOMY_CATEGORY: &str = "category";
const TAXONOMY_TAG: &str = "tag";

const PAGE_COLUMNS: &str =
    "id, kind, status, title, content, author, published_at, modified_at";

/// Counts reported after a snapshot import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub pages: usize,
    pub menus: usize,
    pub menu_entries: usize,
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

fn storage_err(e: libsql::Error) -> OrphanScanError {
    OrphanScanError::Storage(e.to_string())
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OrphanScanError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    OrphanScanError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0,
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(OrphanScanError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    /// Read a site setting.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM site_settings WHERE key = ?1", params![key])
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row.get::<String>(0).map_err(storage_err)?)),
            None => Ok(None),
        }
    }

    /// Write a site setting, replacing any previous value.
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO site_settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Set the site root URL. Cached results are cleared since they depend on it.
    pub async fn set_home_url(&self, url: &str) -> Result<()> {
        self.set_setting(SETTING_HOME_URL, url.trim()).await?;
        self.invalidate_active_caches().await
    }

    /// The scan configuration last activated on this site.
    ///
    /// `include_listable` is not persisted; both variants share one activation.
    pub async fn active_scan_config(&self) -> Result<ScanConfiguration> {
        let mut config = ScanConfiguration::default();
        if let Some(key) = self.get_setting(SETTING_REDIRECT_KEY).await? {
            config.redirect_key = key;
        }
        if let Some(mode) = self.get_setting(SETTING_PROTOCOL_MODE).await? {
            config.protocol_mode = mode.parse().unwrap_or(ProtocolMode::None);
        }
        Ok(config)
    }

    /// Make `config` the active configuration.
    ///
    /// When the redirect key or protocol mode differ from the stored ones, the
    /// cached results of the previous configuration are dropped and `true` is
    /// returned.
    pub async fn activate_config(&self, config: &ScanConfiguration) -> Result<bool> {
        let active = self.active_scan_config().await?;
        let redirect_key = config.effective_redirect_key();

        if active.effective_redirect_key() == redirect_key
            && active.protocol_mode == config.protocol_mode
        {
            return Ok(false);
        }

        self.check_writable()?;
        for key in active.cache_key_variants() {
            self.invalidate(&key).await?;
        }
        self.set_setting(SETTING_REDIRECT_KEY, redirect_key).await?;
        self.set_setting(SETTING_PROTOCOL_MODE, config.protocol_mode.as_str())
            .await?;

        info!(
            redirect_key,
            protocol_mode = %config.protocol_mode,
            previous_redirect_key = active.effective_redirect_key(),
            previous_protocol_mode = %active.protocol_mode,
            "scan configuration changed, previous results invalidated"
        );
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Content mutations
    // -----------------------------------------------------------------------

    /// Insert or replace a page with its terms and custom fields.
    pub async fn upsert_page(&self, record: &PageRecord) -> Result<()> {
        self.check_writable()?;
        let tx = self.begin().await?;
        let outcome = write_page(&tx, record).await;
        finish(tx, outcome).await?;
        self.invalidate_active_caches().await
    }

    /// Set one custom field on a page.
    pub async fn set_metadata(&self, id: PageId, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO page_meta (page_id, meta_key, meta_value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(page_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value",
                params![sql_id(id)?, key, value],
            )
            .await
            .map_err(storage_err)?;
        self.invalidate_active_caches().await
    }

    /// Remove one custom field from a page.
    pub async fn delete_metadata(&self, id: PageId, key: &str) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "DELETE FROM page_meta WHERE page_id = ?1 AND meta_key = ?2",
                params![sql_id(id)?, key],
            )
            .await
            .map_err(storage_err)?;
        self.invalidate_active_caches().await
    }

    /// Permanently remove a page. Returns whether it existed.
    pub async fn delete_page(&self, id: PageId) -> Result<bool> {
        self.check_writable()?;
        let raw = sql_id(id)?;
        let tx = self.begin().await?;
        let outcome = delete_page_rows(&tx, raw).await;
        let removed = finish(tx, outcome).await?;
        self.invalidate_active_caches().await?;
        Ok(removed)
    }

    /// Change the status of the given pages. Returns how many actually changed.
    pub async fn set_status(&self, ids: &[PageId], status: PublishStatus) -> Result<u64> {
        self.check_writable()?;
        let raw_ids = ids.iter().map(|&id| sql_id(id)).collect::<Result<Vec<_>>>()?;
        let tx = self.begin().await?;
        let outcome = update_status(&tx, &raw_ids, status).await;
        let changed = finish(tx, outcome).await?;
        if changed > 0 {
            self.invalidate_active_caches().await?;
        }
        Ok(changed)
    }

    /// Move the given pages back to draft status.
    pub async fn move_to_draft(&self, ids: &[PageId]) -> Result<u64> {
        let changed = self.set_status(ids, PublishStatus::Draft).await?;
        info!(requested = ids.len(), changed, "moved pages to draft");
        Ok(changed)
    }

    /// Replace every navigation menu.
    pub async fn replace_navigation(&self, collections: &[NavigationCollection]) -> Result<()> {
        self.check_writable()?;
        let tx = self.begin().await?;
        let outcome = write_navigation(&tx, collections).await;
        finish(tx, outcome).await?;
        self.invalidate_active_caches().await
    }

    /// Load a whole-site snapshot, replacing all existing pages and menus.
    ///
    /// The import runs in one transaction: on failure the previous content is
    /// kept. Cached results are dropped either way.
    pub async fn import_snapshot(&self, snapshot: &SiteSnapshot) -> Result<ImportSummary> {
        self.check_writable()?;
        self.invalidate_active_caches().await?;

        let tx = self.begin().await?;
        let outcome = write_snapshot(&tx, snapshot).await;
        finish(tx, outcome).await?;
        self.invalidate_active_caches().await?;

        let summary = ImportSummary {
            pages: snapshot.pages.len(),
            menus: snapshot.navigation.len(),
            menu_entries: snapshot.navigation.iter().map(|c| c.entries.len()).sum(),
        };
        info!(
            home_url = %snapshot.home_url,
            pages = summary.pages,
            menus = summary.menus,
            "site snapshot imported"
        );
        Ok(summary)
    }

    async fn begin(&self) -> Result<Transaction> {
        self.conn.transaction().await.map_err(storage_err)
    }

    // -----------------------------------------------------------------------
    // Cache maintenance
    // -----------------------------------------------------------------------

    /// Drop cached results for both variants of the active configuration.
    pub async fn invalidate_active_caches(&self) -> Result<()> {
        let active = self.active_scan_config().await?;
        for key in active.cache_key_variants() {
            self.invalidate(&key).await?;
        }
        Ok(())
    }

    /// Drop every cached result. Returns the number of entries removed.
    pub async fn clear_scan_cache(&self) -> Result<u64> {
        self.check_writable()?;
        let removed = self
            .conn
            .execute("DELETE FROM scan_cache", params![])
            .await
            .map_err(storage_err)?;
        info!(removed, "scan cache cleared");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Row helpers
    // -----------------------------------------------------------------------

    /// Categories and tags, keyed by page. `None` loads terms for every page.
    async fn load_terms(
        &self,
        only: Option<PageId>,
    ) -> Result<HashMap<PageId, (Vec<String>, Vec<String>)>> {
        let mut rows = match only {
            Some(id) => self
                .conn
                .query(
                    "SELECT page_id, taxonomy, name FROM page_terms WHERE page_id = ?1 ORDER BY rowid",
                    params![sql_id(id)?],
                )
                .await
                .map_err(storage_err)?,
            None => self
                .conn
                .query(
                    "SELECT page_id, taxonomy, name FROM page_terms ORDER BY rowid",
                    params![],
                )
                .await
                .map_err(storage_err)?,
        };

        let mut terms: HashMap<PageId, (Vec<String>, Vec<String>)> = HashMap::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let page_id = page_id_from_sql(row.get::<i64>(0).map_err(storage_err)?)?;
            let taxonomy = row.get::<String>(1).map_err(storage_err)?;
            let name = row.get::<String>(2).map_err(storage_err)?;

            let entry = terms.entry(page_id).or_default();
            if taxonomy == TAXONOMY_CATEGORY {
                entry.0.push(name);
            } else {
                entry.1.push(name);
            }
        }
        Ok(terms)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| OrphanScanError::Storage(format!("invalid timestamp '{raw}': {e}")))
}

/// Build a [`Page`] from a row selected with [`PAGE_COLUMNS`].
fn page_from_row(row: &Row) -> Result<Page> {
    let kind: PageKind = row.get::<String>(1).map_err(storage_err)?.parse()?;
    let status: PublishStatus = row.get::<String>(2).map_err(storage_err)?.parse()?;

    Ok(Page {
        id: page_id_from_sql(row.get::<i64>(0).map_err(storage_err)?)?,
        kind,
        status,
        title: row.get::<String>(3).map_err(storage_err)?,
        content: row.get::<String>(4).map_err(storage_err)?,
        author: row.get::<String>(5).ok(),
        published_at: parse_timestamp(&row.get::<String>(6).map_err(storage_err)?)?,
        modified_at: parse_timestamp(&row.get::<String>(7).map_err(storage_err)?)?,
        categories: Vec::new(),
        tags: Vec::new(),
    })
}

/// Commit `tx` when `outcome` is `Ok`, roll it back otherwise.
async fn finish<T>(tx: Transaction, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await.map_err(storage_err)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "transaction rollback failed");
            }
            Err(e)
        }
    }
}

/// Page id as stored in SQLite's signed integer column.
fn sql_id(id: PageId) -> Result<i64> {
    i64::try_from(id.0)
        .map_err(|_| OrphanScanError::validation(format!("page id {id} is out of range")))
}

fn page_id_from_sql(raw: i64) -> Result<PageId> {
    u64::try_from(raw)
        .map(PageId)
        .map_err(|_| OrphanScanError::Storage(format!("negative page id {raw} in database")))
}

async fn write_page(conn: &Connection, record: &PageRecord) -> Result<()> {
    let page = &record.page;
    let id = sql_id(page.id)?;
    let published_at = page.published_at.to_rfc3339();
    let modified_at = page.modified_at.to_rfc3339();

    conn.execute(
        "INSERT INTO pages (id, kind, status, title, permalink, content, author, published_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            kind = excluded.kind,
            status = excluded.status,
            title = excluded.title,
            permalink = excluded.permalink,
            content = excluded.content,
            author = excluded.author,
            published_at = excluded.published_at,
            modified_at = excluded.modified_at",
        params![
            id,
            page.kind.as_str(),
            page.status.as_str(),
            page.title.as_str(),
            record.permalink.as_str(),
            page.content.as_str(),
            page.author.as_deref(),
            published_at.as_str(),
            modified_at.as_str()
        ],
    )
    .await
    .map_err(storage_err)?;

    conn.execute("DELETE FROM page_terms WHERE page_id = ?1", params![id])
        .await
        .map_err(storage_err)?;
    let terms = page
        .categories
        .iter()
        .map(|name| (TAXONOMY_CATEGORY, name))
        .chain(page.tags.iter().map(|name| (TAXONOMY_TAG, name)));
    for (taxonomy, name) in terms {
        conn.execute(
            "INSERT INTO page_terms (page_id, taxonomy, name) VALUES (?1, ?2, ?3)",
            params![id, taxonomy, name.as_str()],
        )
        .await
        .map_err(storage_err)?;
    }

    conn.execute("DELETE FROM page_meta WHERE page_id = ?1", params![id])
        .await
        .map_err(storage_err)?;
    for (key, value) in &record.meta {
        conn.execute(
            "INSERT INTO page_meta (page_id, meta_key, meta_value) VALUES (?1, ?2, ?3)",
            params![id, key.as_str(), value.as_str()],
        )
        .await
        .map_err(storage_err)?;
    }

    debug!(id = %page.id, kind = page.kind.as_str(), "page written");
    Ok(())
}

async fn write_snapshot(conn: &Connection, snapshot: &SiteSnapshot) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM page_terms;
         DELETE FROM page_meta;
         DELETE FROM pages;",
    )
    .await
    .map_err(storage_err)?;

    conn.execute(
        "INSERT INTO site_settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![SETTING_HOME_URL, snapshot.home_url.trim()],
    )
    .await
    .map_err(storage_err)?;

    for record in &snapshot.pages {
        write_page(conn, record).await?;
    }
    write_navigation(conn, &snapshot.navigation).await
}

async fn delete_page_rows(conn: &Connection, id: i64) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM pages WHERE id = ?1", params![id])
        .await
        .map_err(storage_err)?;
    conn.execute("DELETE FROM page_terms WHERE page_id = ?1", params![id])
        .await
        .map_err(storage_err)?;
    conn.execute("DELETE FROM page_meta WHERE page_id = ?1", params![id])
        .await
        .map_err(storage_err)?;
    Ok(removed > 0)
}

async fn update_status(conn: &Connection, ids: &[i64], status: PublishStatus) -> Result<u64> {
    let now = Utc::now().to_rfc3339();
    let mut changed = 0;
    for &id in ids {
        changed += conn
            .execute(
                "UPDATE pages SET status = ?1, modified_at = ?2
                 WHERE id = ?3 AND status != ?1",
                params![status.as_str(), now.as_str(), id],
            )
            .await
            .map_err(storage_err)?;
    }
    Ok(changed)
}

async fn write_navigation(conn: &Connection, collections: &[NavigationCollection]) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM nav_items;
         DELETE FROM nav_menus;",
    )
    .await
    .map_err(storage_err)?;

    for collection in collections {
        conn.execute(
            "INSERT INTO nav_menus (name) VALUES (?1)",
            params![collection.name.as_str()],
        )
        .await
        .map_err(|e| OrphanScanError::Storage(format!("menu '{}': {e}", collection.name)))?;
        let menu_id = conn.last_insert_rowid();

        for entry in &collection.entries {
            conn.execute(
                "INSERT INTO nav_items (menu_id, url, position) VALUES (?1, ?2, ?3)",
                params![menu_id, entry.url.as_str(), entry.order],
            )
            .await
            .map_err(storage_err)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Collaborator trait implementations
// ---------------------------------------------------------------------------

impl ContentStore for Storage {
    async fn list_published_pages(&self, kinds: &[PageKind]) -> Result<Vec<Page>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {PAGE_COLUMNS} FROM pages WHERE status = ?1
                     ORDER BY published_at DESC, id DESC"
                ),
                params![PublishStatus::Publish.as_str()],
            )
            .await
            .map_err(storage_err)?;

        let mut pages = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let page = page_from_row(&row)?;
            if kinds.contains(&page.kind) {
                pages.push(page);
            }
        }

        let mut terms = self.load_terms(None).await?;
        for page in &mut pages {
            if let Some((categories, tags)) = terms.remove(&page.id) {
                page.categories = categories;
                page.tags = tags;
            }
        }
        Ok(pages)
    }

    async fn get_page(&self, id: PageId) -> Result<Option<Page>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?1"),
                params![sql_id(id)?],
            )
            .await
            .map_err(storage_err)?;

        let Some(row) = rows.next().await.map_err(storage_err)? else {
            return Ok(None);
        };
        let mut page = page_from_row(&row)?;
        if let Some((categories, tags)) = self.load_terms(Some(id)).await?.remove(&id) {
            page.categories = categories;
            page.tags = tags;
        }
        Ok(Some(page))
    }

    async fn metadata_field(&self, id: PageId, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT meta_value FROM page_meta WHERE page_id = ?1 AND meta_key = ?2",
                params![sql_id(id)?, key],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row.get::<String>(0).map_err(storage_err)?)),
            None => Ok(None),
        }
    }

    async fn canonical_url(&self, id: PageId) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT permalink FROM pages WHERE id = ?1",
                params![sql_id(id)?],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row.get::<String>(0).map_err(storage_err)?)),
            None => Ok(None),
        }
    }
}

impl NavigationStore for Storage {
    async fn list_navigation_collections(&self) -> Result<Vec<NavigationCollection>> {
        let mut rows = self
            .conn
            .query(
                "SELECT m.name, i.url, i.position
                 FROM nav_menus m
                 LEFT JOIN nav_items i ON i.menu_id = m.id
                 ORDER BY m.id, i.position, i.id",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut collections: Vec<NavigationCollection> = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let name = row.get::<String>(0).map_err(storage_err)?;
            if collections.last().is_none_or(|c| c.name != name) {
                collections.push(NavigationCollection {
                    name,
                    entries: Vec::new(),
                });
            }

            // Menus without items come back as a single row of NULLs.
            if let (Ok(url), Some(current)) = (row.get::<String>(1), collections.last_mut()) {
                current.entries.push(NavigationEntry {
                    url,
                    order: row.get::<u32>(2).unwrap_or(0),
                });
            }
        }
        Ok(collections)
    }
}

impl SiteIdentity for Storage {
    async fn home_url(&self) -> Result<String> {
        match self.get_setting(SETTING_HOME_URL).await? {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(OrphanScanError::validation(
                "site home URL is not set; import a site snapshot first",
            )),
        }
    }
}

impl ScanCache for Storage {
    async fn get(&self, key: &str) -> Result<Option<OrphanResult>> {
        let mut rows = self
            .conn
            .query(
                "SELECT result_json, expires_at FROM scan_cache WHERE cache_key = ?1",
                params![key],
            )
            .await
            .map_err(|e| OrphanScanError::Cache(e.to_string()))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| OrphanScanError::Cache(e.to_string()))?
        else {
            return Ok(None);
        };

        let json = row
            .get::<String>(0)
            .map_err(|e| OrphanScanError::Cache(e.to_string()))?;
        let expires_at = row
            .get::<i64>(1)
            .map_err(|e| OrphanScanError::Cache(e.to_string()))?;

        if expires_at <= Utc::now().timestamp() {
            debug!(key, "cached scan result expired");
            if !self.readonly {
                self.invalidate(key).await?;
            }
            return Ok(None);
        }

        match serde_json::from_str(&json) {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cached scan result");
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, value: &OrphanResult, ttl: Duration) -> Result<()> {
        self.check_writable()?;
        let json =
            serde_json::to_string(value).map_err(|e| OrphanScanError::Cache(e.to_string()))?;
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp().saturating_add(ttl_secs);

        self.conn
            .execute(
                "INSERT INTO scan_cache (cache_key, result_json, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(cache_key) DO UPDATE SET
                    result_json = excluded.result_json,
                    expires_at = excluded.expires_at",
                params![key, json.as_str(), expires_at],
            )
            .await
            .map_err(|e| OrphanScanError::Cache(e.to_string()))?;
        debug!(key, entries = value.len(), ttl_secs, "scan result cached");
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute("DELETE FROM scan_cache WHERE cache_key = ?1", params![key])
            .await
            .map_err(|e| OrphanScanError::Cache(e.to_string()))?;
        Ok(())
    }
}
