//! Single-post relay: render, extract, compose media, deliver.

use crate::models::{Config, FeedConfig, NotifyConfig, PostDetail, PostId};
use crate::render::Renderer;
use crate::services::{
    DocumentExtractor, Extraction, ExtractionWarning, MediaCompositor, Notifier, build_message,
};
use crate::utils::preview;

/// What happened to one post.
#[derive(Debug, Clone)]
pub struct PostReport {
    pub id: PostId,
    pub title: String,
    /// Media presentation label, see [`crate::models::CompositeMedia::kind`]
    pub media: &'static str,
    pub warnings: Vec<ExtractionWarning>,
    /// Delivery error message, if delivery failed
    pub error: Option<String>,
}

impl PostReport {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// Relays individual posts to the notification transport.
///
/// Nothing here aborts: extraction and media problems degrade the message and
/// a delivery failure is reported back to the caller.
pub struct PostRelay<'a> {
    feed: &'a FeedConfig,
    notify: &'a NotifyConfig,
    extractor: DocumentExtractor,
    media: &'a MediaCompositor,
    notifier: &'a dyn Notifier,
}

impl<'a> PostRelay<'a> {
    pub fn new(config: &'a Config, media: &'a MediaCompositor, notifier: &'a dyn Notifier) -> Self {
        Self {
            feed: &config.feed,
            notify: &config.notify,
            extractor: DocumentExtractor::new(config.extraction.clone()),
            media,
            notifier,
        }
    }

    /// Render and extract a post's detail page.
    pub async fn extract(&self, renderer: &dyn Renderer, id: PostId) -> Extraction<PostDetail> {
        let link = self.feed.post_url(id);
        match renderer.render(&link).await {
            Ok(html) => self.extractor.extract(&html, &link),
            Err(e) => {
                log::warn!("Failed to render post {}: {}", id, e);
                Extraction::render_failed(e.to_string())
            }
        }
    }

    /// Relay one post. `fallback_title` is used when the page yields none.
    pub async fn relay(
        &self,
        renderer: &dyn Renderer,
        id: PostId,
        fallback_title: &str,
    ) -> PostReport {
        let link = self.feed.post_url(id);
        let Extraction {
            value: detail,
            warnings,
        } = self.extract(renderer, id).await;

        for warning in &warnings {
            log::debug!("Post {}: {:?}", id, warning);
        }

        let title = if detail.title.is_empty() {
            fallback_title.to_string()
        } else {
            detail.title.clone()
        };
        log::info!("Post {}: {}", id, preview(&title, 40));
        log::debug!("Post {} content: {}", id, preview(&detail.content, 50));
        log::debug!(
            "Post {}: {} menu items, {} images",
            id,
            detail.menu_items.len(),
            detail.image_urls.len()
        );

        let media = self.media.compose(&detail.image_urls).await;
        let message = build_message(&title, &link, &detail, &media, self.notify);

        let error = match self.notifier.deliver(&message).await {
            Ok(()) => {
                log::info!("Delivered post {}", id);
                None
            }
            Err(e) => {
                log::error!("Delivery of post {} failed: {}", id, e);
                Some(e.to_string())
            }
        };

        PostReport {
            id,
            title,
            media: media.kind(),
            warnings,
            error,
        }
    }
}
