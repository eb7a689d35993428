//! URL normalization, relative-link resolution and link extraction.
//!
//! This crate provides:
//! - [`normalize`]: canonical comparison form for URLs
//! - [`resolve`]: relative → absolute resolution against a page URL
//! - [`tokenizer`]: link-bearing attribute scanner for raw markup
//! - [`LinkExtractor`]: internal-link extraction from bodies, redirects and menus

pub mod extract;
pub mod normalize;
pub mod resolve;
pub mod tokenizer;

pub use extract::LinkExtractor;
pub use normalize::{apply_protocol_mode, has_file_extension, normalize};
pub use resolve::{collapse_dot_segments, origin_of, resolve};
pub use tokenizer::{LinkAttribute, LinkToken, strip_fragment, tokenize};
