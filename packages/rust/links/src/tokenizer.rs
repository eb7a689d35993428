//! Pattern-based tokenizer for link-bearing attributes in raw markup.
//!
//! Grammar: `(href|src|srcset) \s* = \s* quote value quote`, attribute names
//! case-insensitive and matched anywhere (so `data-src` lazy-load attributes
//! count too). A value ends at the first `#`. Values are kept when they are
//! fully qualified `http(s)://` URLs or contain no `:` at all, which filters out
//! `mailto:`, `tel:`, `javascript:` and `data:` references. `srcset` lists are
//! split into their individual candidate URLs.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::has_prefix_ignore_case;

/// Which attribute a token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAttribute {
    Href,
    Src,
    Srcset,
}

/// One link reference found in markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkToken<'a> {
    pub attribute: LinkAttribute,
    /// Raw reference with any fragment removed. Never empty.
    pub value: &'a str,
}

/// Scan `content` for link references, in document order.
pub fn tokenize(content: &str) -> Vec<LinkToken<'_>> {
    static ATTRIBUTE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)(href|srcset|src)\s*=\s*["']([^"']*)["']"#).expect("valid regex")
    });

    let mut tokens = Vec::new();
    for caps in ATTRIBUTE_VALUE.captures_iter(content) {
        let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let attribute = match name.as_str().to_ascii_lowercase().as_str() {
            "href" => LinkAttribute::Href,
            "srcset" => LinkAttribute::Srcset,
            _ => LinkAttribute::Src,
        };

        if attribute == LinkAttribute::Srcset {
            for candidate in value.as_str().split(',') {
                let url = candidate.split_whitespace().next().unwrap_or("");
                push_token(&mut tokens, attribute, url);
            }
        } else {
            push_token(&mut tokens, attribute, value.as_str());
        }
    }
    tokens
}

fn push_token<'a>(tokens: &mut Vec<LinkToken<'a>>, attribute: LinkAttribute, raw: &'a str) {
    let value = strip_fragment(raw).trim();
    if value.is_empty() {
        return;
    }
    if is_fully_qualified(value) || !value.contains(':') {
        tokens.push(LinkToken { attribute, value });
    }
}

/// Everything before the first `#`.
pub fn strip_fragment(reference: &str) -> &str {
    reference.split('#').next().unwrap_or(reference)
}

fn is_fully_qualified(value: &str) -> bool {
    has_prefix_ignore_case(value, "http://") || has_prefix_ignore_case(value, "https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(content: &str) -> Vec<&str> {
        tokenize(content).into_iter().map(|t| t.value).collect()
    }

    #[test]
    fn finds_href_and_src() {
        let html = r#"<a href="/about/">About</a><img SRC='img/logo.png'><a href="https://example.com/x">x</a>"#;
        assert_eq!(values(html), vec!["/about/", "img/logo.png", "https://example.com/x"]);
    }

    #[test]
    fn classifies_attributes() {
        let tokens = tokenize(r#"<a href="a/"></a><img src="b.png" srcset="c.png 2x">"#);
        let kinds: Vec<_> = tokens.iter().map(|t| t.attribute).collect();
        assert_eq!(kinds, vec![LinkAttribute::Href, LinkAttribute::Src, LinkAttribute::Srcset]);
    }

    #[test]
    fn cuts_fragments_and_drops_bare_anchors() {
        let html = r##"<a href="/guide/#install">g</a><a href="#top">top</a>"##;
        assert_eq!(values(html), vec!["/guide/"]);
    }

    #[test]
    fn rejects_non_http_schemes() {
        let html = r#"<a href="mailto:a@b.c">m</a><a href="tel:123">t</a>
            <a href="javascript:void(0)">j</a><img src="data:image/png;base64,AAA">"#;
        assert!(values(html).is_empty());
    }

    #[test]
    fn splits_srcset_candidates() {
        let html = r#"<img srcset="/img/a-320.jpg 320w, /img/a-640.jpg 640w,https://cdn.example.com/a.jpg 2x">"#;
        assert_eq!(
            values(html),
            vec!["/img/a-320.jpg", "/img/a-640.jpg", "https://cdn.example.com/a.jpg"]
        );
    }

    #[test]
    fn matches_prefixed_attributes_and_spacing() {
        let html = r#"<img data-src = "/lazy.png"><a HREF= 'contact/'>c</a>"#;
        assert_eq!(values(html), vec!["/lazy.png", "contact/"]);
    }

    #[test]
    fn protocol_relative_is_kept() {
        assert_eq!(values(r#"<script src="//cdn.example.com/x.js"></script>"#), vec!["//cdn.example.com/x.js"]);
    }
}
