//! SQL migration definitions for the site database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: settings, pages, terms, meta, menus, scan cache",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Site-wide key/value settings (home URL, active scan configuration)
CREATE TABLE IF NOT EXISTS site_settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Posts and pages
CREATE TABLE IF NOT EXISTS pages (
    id           INTEGER PRIMARY KEY,
    kind         TEXT NOT NULL,
    status       TEXT NOT NULL,
    title        TEXT NOT NULL DEFAULT '',
    permalink    TEXT NOT NULL,
    content      TEXT NOT NULL DEFAULT '',
    author       TEXT,
    published_at TEXT NOT NULL,
    modified_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_status_kind ON pages(status, kind);

-- Categories and tags
CREATE TABLE IF NOT EXISTS page_terms (
    page_id  INTEGER NOT NULL,
    taxonomy TEXT NOT NULL,
    name     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_page_terms_page ON page_terms(page_id);

-- Custom fields
CREATE TABLE IF NOT EXISTS page_meta (
    page_id    INTEGER NOT NULL,
    meta_key   TEXT NOT NULL,
    meta_value TEXT NOT NULL,
    PRIMARY KEY (page_id, meta_key)
);

-- Navigation menus
CREATE TABLE IF NOT EXISTS nav_menus (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS nav_items (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    menu_id  INTEGER NOT NULL,
    url      TEXT NOT NULL,
    position INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_nav_items_menu ON nav_items(menu_id);

-- Orphan scan results keyed by scan configuration
CREATE TABLE IF NOT EXISTS scan_cache (
    cache_key   TEXT PRIMARY KEY,
    result_json TEXT NOT NULL,
    expires_at  INTEGER NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
