//! URL canonicalization for link comparison.
//!
//! Two addresses that point at the same page must normalize to the same
//! string. The normal form is `scheme://host` + decoded path: port, query and
//! fragment are dropped, and extension-less paths always end in `/`. Only
//! `%`, `?` and `#` stay escaped in the path.

use std::borrow::Cow;

use orphanscan_shared::{NormalizedUrl, ProtocolMode};
use percent_encoding::percent_decode_str;
use url::Url;

/// Normalize `url` for comparison under `mode`.
///
/// Returns `None` for empty input and for anything without both a scheme and
/// a host (relative references, `mailto:`, `javascript:` and the like). Such
/// URLs simply do not take part in comparisons.
///
/// Hosts come out lowercase because the `url` parser folds them.
pub fn normalize(url: &str, mode: ProtocolMode) -> Option<NormalizedUrl> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let rewritten = apply_protocol_mode(trimmed, mode);
    let parsed = Url::parse(&rewritten).ok()?;
    let host = parsed.host_str().filter(|h| !h.is_empty())?;

    let mut path = decode_path(parsed.path());
    if !path.ends_with('/') && !has_file_extension(&path) {
        path.push('/');
    }

    Some(NormalizedUrl::from_normalized(format!(
        "{}://{host}{path}",
        parsed.scheme()
    )))
}

/// Rewrite a leading `http:`/`https:` token (case-insensitive) per `mode`.
///
/// URLs without that exact prefix pass through unchanged.
pub fn apply_protocol_mode(url: &str, mode: ProtocolMode) -> Cow<'_, str> {
    match mode {
        ProtocolMode::ForceSecure if has_prefix_ignore_case(url, "http:") => {
            Cow::Owned(format!("https:{}", &url["http:".len()..]))
        }
        ProtocolMode::ForceInsecure if has_prefix_ignore_case(url, "https:") => {
            Cow::Owned(format!("http:{}", &url["https:".len()..]))
        }
        _ => Cow::Borrowed(url),
    }
}

/// Whether the last path segment looks like a file name (`name.ext`).
///
/// A trailing `/` is ignored, so `/v1.2/` counts as file-like just as `/v1.2` does.
pub fn has_file_extension(path: &str) -> bool {
    let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    last.rsplit_once('.').is_some_and(|(_, ext)| !ext.is_empty())
}

/// Percent-decode a path, keeping `%`, `?` and `#` escaped so the result
/// parses back to the same path.
fn decode_path(path: &str) -> String {
    if path.is_empty() {
        return "/".into();
    }
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let mut out = String::with_capacity(decoded.len());
    for c in decoded.chars() {
        match c {
            '%' => out.push_str("%25"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(url: &str) -> Option<String> {
        normalize(url, ProtocolMode::None).map(|u| u.to_string())
    }

    #[test]
    fn strips_port_query_and_fragment() {
        assert_eq!(
            norm("https://Example.com:8080/Foo?x=1#frag").as_deref(),
            Some("https://example.com/Foo/")
        );
    }

    #[test]
    fn file_paths_keep_their_shape() {
        assert_eq!(norm("https://example.com/img/logo.png").as_deref(), Some("https://example.com/img/logo.png"));
        assert_eq!(norm("https://example.com/about").as_deref(), Some("https://example.com/about/"));
        assert_eq!(norm("https://example.com/about/").as_deref(), Some("https://example.com/about/"));
    }

    #[test]
    fn bare_host_gets_root_path() {
        assert_eq!(norm("https://example.com").as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn force_secure_rewrites_scheme() {
        let url = normalize("http://x/y.png", ProtocolMode::ForceSecure).unwrap();
        assert_eq!(url, "https://x/y.png");

        let url = normalize("HTTP://x/y", ProtocolMode::ForceSecure).unwrap();
        assert_eq!(url, "https://x/y/");
    }

    #[test]
    fn force_insecure_rewrites_scheme() {
        let url = normalize("https://x/docs", ProtocolMode::ForceInsecure).unwrap();
        assert_eq!(url, "http://x/docs/");
    }

    #[test]
    fn protocol_mode_needs_exact_prefix() {
        assert_eq!(apply_protocol_mode("ftp://x/", ProtocolMode::ForceSecure), "ftp://x/");
        assert_eq!(apply_protocol_mode("//x/a", ProtocolMode::ForceSecure), "//x/a");
        assert_eq!(apply_protocol_mode("https://x/", ProtocolMode::ForceSecure), "https://x/");
    }

    #[test]
    fn decodes_percent_encoding() {
        assert_eq!(
            norm("https://example.com/caf%C3%A9/a%20b").as_deref(),
            Some("https://example.com/café/a b/")
        );
    }

    #[test]
    fn escaped_delimiters_stay_in_the_path() {
        assert_eq!(
            norm("https://example.com/faq%3Fq").as_deref(),
            Some("https://example.com/faq%3Fq/")
        );
        assert_eq!(
            norm("https://example.com/c%23/guide").as_deref(),
            Some("https://example.com/c%23/guide/")
        );
        assert_eq!(
            norm("https://example.com/100%25/").as_deref(),
            Some("https://example.com/100%25/")
        );
    }

    #[test]
    fn unusable_inputs_yield_none() {
        assert_eq!(norm(""), None);
        assert_eq!(norm("   "), None);
        assert_eq!(norm("/relative/path"), None);
        assert_eq!(norm("page.html"), None);
        assert_eq!(norm("mailto:someone@example.com"), None);
        assert_eq!(norm("javascript:void(0)"), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        for url in [
            "https://Example.com:8080/Foo?x=1#frag",
            "http://example.com/a/b/c.html?q",
            "https://example.com/caf%C3%A9",
            "https://example.com",
            "https://example.com/v1.2/",
            "https://example.com/faq%3Fq",
            "https://example.com/c%23/guide",
            "https://example.com/100%25/",
        ] {
            let once = normalize(url, ProtocolMode::None).unwrap();
            let twice = normalize(once.as_str(), ProtocolMode::None).unwrap();
            assert_eq!(once, twice, "not idempotent for {url}");
        }
    }

    #[test]
    fn extension_detection() {
        assert!(has_file_extension("/a/b.html"));
        assert!(has_file_extension("/v1.2/"));
        assert!(has_file_extension("/.htaccess"));
        assert!(!has_file_extension("/a/b/"));
        assert!(!has_file_extension("/a/file."));
        assert!(!has_file_extension("/"));
    }
}
