//! Post data structures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Numeric post identifier.
///
/// The source assigns ids in increasing order, so numeric ordering of ids is
/// chronological ordering of posts (higher id = newer).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PostId(u64);

impl PostId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl FromStr for PostId {
    type Err = AppError;

    /// Accepts only non-empty strings made entirely of ASCII digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::InvalidPostId(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| AppError::InvalidPostId(s.to_string()))
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A post as it appears in the feed listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostSummary {
    /// Post identifier
    pub id: PostId,

    /// Title shown in the listing (placeholder when the listing has none)
    pub title: String,

    /// Full URL to the post
    pub link: String,

    /// Whether the source flags the post as pinned
    pub is_pinned: bool,
}

/// One named item listed inside a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuItem {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl MenuItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_url: None,
        }
    }
}

/// Structured content extracted from a post's detail page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostDetail {
    /// Title found on the detail page (empty when none qualified)
    pub title: String,

    /// Newline-joined body text (possibly empty)
    pub content: String,

    /// Short listed items in document order, unique by name
    pub menu_items: Vec<MenuItem>,

    /// Content image URLs in document order, unique, https-normalized
    pub image_urls: Vec<String>,
}

impl PostDetail {
    /// Names of the menu items, in order.
    pub fn menu_names(&self) -> Vec<&str> {
        self.menu_items.iter().map(|item| item.name.as_str()).collect()
    }

    /// True when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.content.is_empty()
            && self.menu_items.is_empty()
            && self.image_urls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_id() {
        let id: PostId = "111531719".parse().unwrap();
        assert_eq!(id.value(), 111_531_719);
        assert_eq!(id.to_string(), "111531719");
    }

    #[test]
    fn test_reject_non_numeric_id() {
        assert!("abc".parse::<PostId>().is_err());
        assert!("12a".parse::<PostId>().is_err());
        assert!("".parse::<PostId>().is_err());
        assert!("-5".parse::<PostId>().is_err());
        assert!("99999999999999999999999".parse::<PostId>().is_err());
    }

    #[test]
    fn test_ordering_is_numeric() {
        let small: PostId = "99".parse().unwrap();
        let large: PostId = "100".parse().unwrap();
        assert!(small < large);
    }

    #[test]
    fn test_empty_detail() {
        assert!(PostDetail::default().is_empty());
        let detail = PostDetail {
            menu_items: vec![MenuItem::named("김밥")],
            ..PostDetail::default()
        };
        assert!(!detail.is_empty());
        assert_eq!(detail.menu_names(), vec!["김밥"]);
    }
}
