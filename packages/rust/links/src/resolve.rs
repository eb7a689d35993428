//! Relative → absolute URL resolution against a page URL.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::normalize::has_file_extension;

/// Resolve a link reference found on the page at `base_url`.
///
/// `origin` is the site root origin (`scheme://host[:port]`); root-relative and
/// path-relative references are anchored to it. Fully qualified references are
/// returned unchanged and protocol-relative ones take the scheme of `base_url`.
///
/// Callers strip `#fragment` suffixes before calling.
pub fn resolve(reference: &str, base_url: &str, origin: &str) -> String {
    if Url::parse(reference).is_ok() {
        return reference.to_string();
    }

    let base = Url::parse(base_url).ok();

    if reference.starts_with("//") {
        let scheme = base.as_ref().map_or("https", |u| u.scheme());
        return format!("{scheme}:{reference}");
    }

    if reference.starts_with('/') {
        return format!("{origin}{reference}");
    }

    let base_path = base.as_ref().map_or("/", |u| u.path());
    let joined = format!("{}{reference}", base_directory(base_path));
    format!("{origin}{}", collapse_dot_segments(&joined))
}

/// Origin (`scheme://host[:port]`) of an absolute URL. Default ports are omitted.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    match parsed.port() {
        Some(port) => Some(format!("{}://{host}:{port}", parsed.scheme())),
        None => Some(format!("{}://{host}", parsed.scheme())),
    }
}

/// Directory a path-relative reference is joined onto, always slash-terminated.
///
/// File-like paths (`/a/c.html`) contribute their containing directory (`/a/`);
/// anything else is taken as a directory itself.
fn base_directory(path: &str) -> String {
    let dir = if path.is_empty() {
        "/"
    } else if has_file_extension(path) {
        parent_directory(path)
    } else {
        path
    };

    if dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{dir}/")
    }
}

fn parent_directory(path: &str) -> &str {
    match path.trim_end_matches('/').rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

/// Collapse `/./` segments, then `/segment/../` pairs one at a time until none remain.
pub fn collapse_dot_segments(path: &str) -> String {
    static PARENT_SEGMENT: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"/[^/]+/\.\./").expect("valid regex"));

    let mut out = path.to_string();
    while out.contains("/./") {
        out = out.replace("/./", "/");
    }
    while PARENT_SEGMENT.is_match(&out) {
        out = PARENT_SEGMENT.replacen(&out, 1, "/").into_owned();
    }
    out
}
