//! Utility functions and helpers.

pub mod http;
pub mod text;
pub mod url;

pub use text::{char_len, fill_template, normalize_whitespace, preview, truncate_chars};
pub use url::{normalize_https, parse_post_id};
