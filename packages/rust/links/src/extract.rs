//! Internal link extraction from page bodies, redirect fields and menus.

use orphanscan_shared::{NormalizedUrl, OrphanScanError, ProtocolMode, Result};
use tracing::trace;

use crate::normalize::normalize;
use crate::resolve::{origin_of, resolve};
use crate::tokenizer::{strip_fragment, tokenize};

/// Resolves and normalizes link references, keeping only those inside the site.
///
/// A link is internal when its normalized form starts with the normalized home
/// URL.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    home_url: String,
    home: NormalizedUrl,
    origin: String,
    mode: ProtocolMode,
}

impl LinkExtractor {
    /// Build an extractor for the site rooted at `home_url`.
    pub fn new(home_url: &str, mode: ProtocolMode) -> Result<Self> {
        let home = normalize(home_url, mode).ok_or_else(|| {
            OrphanScanError::validation(format!("home URL '{home_url}' cannot be normalized"))
        })?;
        let origin = origin_of(home_url.trim()).ok_or_else(|| {
            OrphanScanError::validation(format!("home URL '{home_url}' has no origin"))
        })?;

        Ok(Self {
            home_url: home_url.trim().to_string(),
            home,
            origin,
            mode,
        })
    }

    /// Normalized home URL.
    pub fn home(&self) -> &NormalizedUrl {
        &self.home
    }

    /// Whether a normalized URL belongs to this site.
    pub fn is_internal(&self, url: &NormalizedUrl) -> bool {
        url.starts_with(&self.home)
    }

    /// Resolve `reference` against `base_url`, normalize it and keep it if internal.
    pub fn internal_link(&self, reference: &str, base_url: &str) -> Option<NormalizedUrl> {
        let reference = strip_fragment(reference).trim();
        if reference.is_empty() {
            return None;
        }

        let absolute = resolve(reference, base_url, &self.origin);
        let normalized = normalize(&absolute, self.mode)?;
        if self.is_internal(&normalized) {
            Some(normalized)
        } else {
            trace!(%normalized, "external link discarded");
            None
        }
    }

    /// Internal links referenced from a page body, in document order (may repeat).
    pub fn body_links(&self, content: &str, base_url: &str) -> Vec<NormalizedUrl> {
        tokenize(content)
            .into_iter()
            .filter_map(|token| self.internal_link(token.value, base_url))
            .collect()
    }

    /// The target of a redirect metadata value, if it points inside the site.
    pub fn redirect_link(&self, value: &str, base_url: &str) -> Option<NormalizedUrl> {
        self.internal_link(value, base_url)
    }

    /// The target of a menu entry. Relative targets resolve against the home URL.
    pub fn navigation_link(&self, target: &str) -> Option<NormalizedUrl> {
        self.internal_link(target, &self.home_url)
    }
}
