//! Media presentation decided for one post.

use std::fmt;

/// How a post's images are presented in the outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositeMedia {
    /// The post has no content images.
    None,

    /// Small image counts are forwarded as-is (https-normalized).
    PassThrough(Vec<String>),

    /// A generated collage hosted at `url`.
    Composite {
        url: String,
        /// Number of images referenced by the post
        count: usize,
        /// Number of images that made it into the collage
        included: usize,
    },

    /// Composition or hosting failed; only a textual count is shown.
    TextOnly { count: usize, reason: MediaFailure },
}

impl CompositeMedia {
    /// Number of images the post referenced.
    pub fn source_count(&self) -> usize {
        match self {
            Self::None => 0,
            Self::PassThrough(urls) => urls.len(),
            Self::Composite { count, .. } | Self::TextOnly { count, .. } => *count,
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PassThrough(_) => "pass-through",
            Self::Composite { .. } => "composite",
            Self::TextOnly { .. } => "text-only",
        }
    }
}

/// Why a collage could not be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFailure {
    /// None of the source images could be fetched and decoded
    CollageFailed,
    /// The collage was built but the image host did not accept it
    UploadFailed,
}

impl fmt::Display for MediaFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CollageFailed => write!(f, "collage failed"),
            Self::UploadFailed => write!(f, "upload failed"),
        }
    }
}
