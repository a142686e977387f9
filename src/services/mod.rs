//! Service layer for the relay.
//!
//! This module contains the business logic for:
//! - Feed listing (`FeedLister`)
//! - Post detail extraction (`DocumentExtractor`)
//! - Media composition (`MediaCompositor`)
//! - Collage hosting (`ImageHost`)
//! - Webhook delivery (`Notifier`)

mod extractor;
mod feed;
mod hosting;
mod media;
mod notify;

use scraper::Selector;

use crate::error::{AppError, Result};

pub use extractor::{
    CONTENT_STRATEGIES, ContentRule, DocumentExtractor, Extraction, ExtractionWarning, Scope,
    Strategy, TITLE_STRATEGIES, TitleRule,
};
pub use feed::FeedLister;
pub use hosting::{ImageHost, ZeroXZeroHost};
pub use media::{HttpImageFetcher, ImageFetcher, MediaCompositor, build_collage, grid_dimensions};
pub use notify::{Notifier, SlackNotifier, build_message};

/// Parse a CSS selector, mapping failures to [`AppError::Selector`].
pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
