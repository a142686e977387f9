//! Rendering collaborator.
//!
//! The feed populates asynchronously, so the core never fetches pages itself:
//! it asks a [`Renderer`] for the settled HTML of a URL and runs its selector
//! queries over that document.
//!
//! - `ChromeRenderer`: headless Chromium, one page per batch (`browser` feature, default)
//! - [`HttpRenderer`]: plain GET of the served markup, for static pages and tests

#[cfg(feature = "browser")]
mod chrome;
mod http;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, RendererKind};

#[cfg(feature = "browser")]
pub use chrome::ChromeRenderer;
pub use http::HttpRenderer;

/// Produces rendered documents for URLs.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigate to `url`, wait for the page to settle and return its HTML.
    async fn render(&self, url: &str) -> Result<String>;

    /// Release the underlying resources. Must be safe to call more than once.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Acquire the renderer selected in the configuration.
pub async fn launch(config: &CrawlerConfig) -> Result<Box<dyn Renderer>> {
    match config.renderer {
        RendererKind::Http => Ok(Box::new(
            HttpRenderer::new(config)?
                .with_settle_delay(Duration::from_millis(config.settle_delay_ms)),
        )),
        #[cfg(feature = "browser")]
        RendererKind::Chrome => Ok(Box::new(ChromeRenderer::launch(config).await?)),
        #[cfg(not(feature = "browser"))]
        RendererKind::Chrome => Err(AppError::config(
            "crawler.renderer = \"chrome\" requires building with the `browser` feature",
        )),
    }
}
