//! Orphan detection core for orphanscan.
//!
//! This crate ties the link extractor to the collaborator traits: it builds the
//! page inventory, collects every linked URL, and reconciles the two into an
//! [`OrphanResult`](orphanscan_shared::OrphanResult), optionally behind a cache.

pub mod cache;
pub mod details;
pub mod inventory;
pub mod linked;
pub mod memory;
pub mod reconcile;

pub use cache::{ContentMutation, MemoryCache, invalidate_for_mutation};
pub use details::{PageDetails, details_for, page_details, report};
pub use inventory::{Inventory, InventoryCollision, build_inventory};
pub use linked::{ScanDeadline, collect_linked_urls};
pub use memory::MemorySite;
pub use reconcile::{ScanProgress, SilentProgress, find_orphans, find_orphans_cached, orphans_from};
