// src/services/media.rs

//! Media composition.
//!
//! Decides how a post's images are presented: nothing, forwarded as-is, or
//! merged into a single collage that is uploaded to an image host. Failures
//! here never abort delivery; they degrade to a textual image count.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

use crate::error::{AppError, Result};
use crate::models::{CompositeMedia, MediaConfig, MediaFailure};
use crate::services::hosting::{ImageHost, ZeroXZeroHost};
use crate::utils::http::create_image_client;
use crate::utils::normalize_https;

/// Downloads raw image bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches images over HTTP with the configured timeout and user agent.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(config: &MediaConfig) -> Result<Self> {
        Ok(Self {
            client: create_image_client(config)?,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::image(format!("GET {url} answered {status}")));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Grid size `(columns, rows)` for `count` tiles.
pub fn grid_dimensions(count: usize, max_columns: u32) -> (u32, u32) {
    if count == 0 || max_columns == 0 {
        return (0, 0);
    }
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    let columns = count.min(max_columns);
    (columns, count.div_ceil(columns))
}

/// Lay images out on a fixed-cell grid.
///
/// Each image is shrunk to fit its `thumb_size` cell (never enlarged) and
/// centered in it, row-major in input order, over the background color.
pub fn build_collage(images: &[DynamicImage], settings: &MediaConfig) -> RgbImage {
    let cell = settings.thumb_size;
    let (columns, rows) = grid_dimensions(images.len(), settings.max_columns);
    let mut canvas = RgbImage::from_pixel(
        columns.saturating_mul(cell),
        rows.saturating_mul(cell),
        Rgb(settings.background),
    );

    for (index, image) in images.iter().enumerate() {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        let (width, height) = image.dimensions();
        let tile = if width > cell || height > cell {
            image.resize(cell, cell, FilterType::Lanczos3)
        } else {
            image.clone()
        };
        let tile = tile.to_rgb8();

        let x = (index % columns) * cell + (cell - tile.width()) / 2;
        let y = (index / columns) * cell + (cell - tile.height()) / 2;
        imageops::replace(&mut canvas, &tile, i64::from(x), i64::from(y));
    }

    canvas
}

fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(canvas)?;
    Ok(buffer.into_inner())
}

/// Decode what can be decoded, build the collage and encode it.
///
/// Returns `None` when no image decoded.
fn render_collage(
    sources: Vec<Vec<u8>>,
    settings: &MediaConfig,
) -> Result<Option<(Vec<u8>, usize)>> {
    let images: Vec<DynamicImage> = sources
        .iter()
        .filter_map(|bytes| match image::load_from_memory(bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Skipping undecodable image: {}", e);
                None
            }
        })
        .collect();

    if images.is_empty() {
        return Ok(None);
    }

    let canvas = build_collage(&images, settings);
    Ok(Some((encode_jpeg(&canvas, settings.jpeg_quality)?, images.len())))
}

/// Chooses and produces the media presentation for a post.
pub struct MediaCompositor {
    settings: MediaConfig,
    fetcher: Arc<dyn ImageFetcher>,
    host: Arc<dyn ImageHost>,
}

impl MediaCompositor {
    pub fn new(
        settings: MediaConfig,
        fetcher: Arc<dyn ImageFetcher>,
        host: Arc<dyn ImageHost>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            host,
        }
    }

    /// Compositor using HTTP image downloads and the configured image host.
    pub fn from_config(settings: &MediaConfig) -> Result<Self> {
        Ok(Self::new(
            settings.clone(),
            Arc::new(HttpImageFetcher::new(settings)?),
            Arc::new(ZeroXZeroHost::new(settings)?),
        ))
    }

    /// Decide the presentation for `image_urls`. Never fails.
    pub async fn compose(&self, image_urls: &[String]) -> CompositeMedia {
        let count = image_urls.len();
        if count == 0 {
            return CompositeMedia::None;
        }
        if count <= self.settings.pass_through_max {
            return CompositeMedia::PassThrough(
                image_urls.iter().map(|url| normalize_https(url)).collect(),
            );
        }

        let fetches = image_urls.iter().map(|url| async move {
            let url = normalize_https(url);
            match self.fetcher.fetch(&url).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    log::warn!("Failed to fetch image {}: {}", url, e);
                    None
                }
            }
        });
        let sources: Vec<Vec<u8>> = futures::future::join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect();

        let settings = self.settings.clone();
        let rendered = tokio::task::spawn_blocking(move || render_collage(sources, &settings))
            .await
            .map_err(AppError::image)
            .and_then(|result| result);

        let (jpeg, included) = match rendered {
            Ok(Some(collage)) => collage,
            Ok(None) => {
                log::warn!("No image of {} could be decoded", count);
                return CompositeMedia::TextOnly {
                    count,
                    reason: MediaFailure::CollageFailed,
                };
            }
            Err(e) => {
                log::warn!("Collage generation failed: {}", e);
                return CompositeMedia::TextOnly {
                    count,
                    reason: MediaFailure::CollageFailed,
                };
            }
        };

        match self.host.upload(jpeg).await {
            Ok(url) => {
                log::info!("Collage of {}/{} images hosted at {}", included, count, url);
                CompositeMedia::Composite {
                    url,
                    count,
                    included,
                }
            }
            Err(e) => {
                log::warn!("Collage upload failed: {}", e);
                CompositeMedia::TextOnly {
                    count,
                    reason: MediaFailure::UploadFailed,
                }
            }
        }
    }
}
