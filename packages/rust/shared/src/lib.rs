//! Shared types, error model, configuration and collaborator traits for orphanscan.
//!
//! This crate is the foundation depended on by all other orphanscan crates.
//! It provides:
//! - [`OrphanScanError`]: the unified error type
//! - Domain types ([`Page`], [`ScanConfiguration`], [`NormalizedUrl`], [`OrphanResult`])
//! - Configuration ([`AppConfig`], [`ScanLimits`], config loading)
//! - Collaborator traits ([`ContentStore`], [`NavigationStore`], [`SiteIdentity`], [`ScanCache`])

pub mod config;
pub mod error;
pub mod store;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_MAX_DURATION_SECS, DefaultsConfig, ScanLimits,
    ScanSection, config_dir, config_file_path, expand_home, init_config, load_config,
    load_config_from,
};
pub use error::{OrphanScanError, Result};
pub use store::{ContentStore, NavigationStore, ScanCache, SiteIdentity};
pub use types::{
    DEFAULT_REDIRECT_KEY, NavigationCollection, NavigationEntry, NormalizedUrl, OrphanEntry,
    OrphanResult, Page, PageId, PageKind, PageRecord, ProtocolMode, PublishStatus,
    ScanConfiguration, SiteSnapshot,
};
