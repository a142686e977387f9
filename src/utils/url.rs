// src/utils/url.rs

//! URL manipulation utilities.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::models::PostId;

/// Rewrite a leading `http://` to `https://`; any other URL is returned as-is.
///
/// # Examples
/// ```
/// use feed_relay::utils::url::normalize_https;
///
/// assert_eq!(normalize_https("http://k.kakaocdn.net/a.jpg"), "https://k.kakaocdn.net/a.jpg");
/// assert_eq!(normalize_https("https://k.kakaocdn.net/a.jpg"), "https://k.kakaocdn.net/a.jpg");
/// ```
pub fn normalize_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    base.join(href).ok()
}

fn trailing_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/(\d+)$").ok()).as_ref()
}

/// Extract a post id from either a bare numeric id or a post URL.
///
/// URLs must end in a `/{digits}` segment.
pub fn parse_post_id(input: &str) -> Option<PostId> {
    let input = input.trim();
    if let Some(caps) = trailing_id_pattern().and_then(|re| re.captures(input)) {
        return caps.get(1).and_then(|m| m.as_str().parse().ok());
    }
    input.parse().ok()
}

/// Extract the post id from an anchor path of the form `/{channel_id}/{id}`.
///
/// Only the segment directly after the channel id is considered, and it must
/// be entirely numeric.
pub fn post_id_from_path(path: &str, channel_id: &str) -> Option<PostId> {
    let mut segments = path.trim_start_matches('/').split('/');
    if segments.next()? != channel_id {
        return None;
    }
    segments.next()?.parse().ok()
}
