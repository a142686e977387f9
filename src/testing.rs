//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::error::{AppError, Result};
use crate::models::{Block, FeedConfig, PostId, SlackMessage};
use crate::render::Renderer;
use crate::services::{ImageFetcher, ImageHost, Notifier};
use crate::storage::WatermarkStore;

/// PNG-encoded solid image.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 30, 30])));
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("encode png");
    buffer.into_inner()
}

/// Feed markup listing `(id, title, pinned)` entries in the given order.
pub fn feed_html(channel_id: &str, posts: &[(u64, &str, bool)]) -> String {
    let items: String = posts
        .iter()
        .map(|(id, title, pinned)| {
            let marker = if *pinned { "<span>고정됨</span>" } else { "" };
            format!(
                r#"<div class="item">{marker}<a href="/{channel_id}/{id}"><strong>{title}</strong></a></div>"#
            )
        })
        .collect();
    format!("<html><body><main>{items}</main></body></html>")
}

/// Detail page markup with a title, one body line and content images.
pub fn post_html(title: &str, body: &str, images: &[&str]) -> String {
    let imgs: String = images
        .iter()
        .map(|src| format!(r#"<img alt="이미지" src="{src}">"#))
        .collect();
    format!(
        "<html><body><main><article><strong>{title}</strong><div>{body}</div>{imgs}</article></main></body></html>"
    )
}

/// Serves canned pages by URL and counts `close` calls.
#[derive(Default)]
pub struct FakeRenderer {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    rendered: Mutex<Vec<String>>,
    closed: AtomicUsize,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn with_feed(self, feed: &FeedConfig, posts: &[(u64, &str, bool)]) -> Self {
        let html = feed_html(&feed.channel_id, posts);
        self.with_page(feed.feed_url(), html)
    }

    pub fn failing_on(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().expect("lock").clone()
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        self.rendered.lock().expect("lock").push(url.to_string());
        if self.failing.contains(url) {
            return Err(AppError::render(url, "navigation timeout"));
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::render(url, "no such page"))
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Records delivered messages; fails for posts whose link is listed.
#[derive(Default)]
pub struct RecordingNotifier {
    failing_links: HashSet<String>,
    delivered: Mutex<Vec<SlackMessage>>,
    attempts: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, link: impl Into<String>) -> Self {
        self.failing_links.insert(link.into());
        self
    }

    pub fn delivered(&self) -> Vec<SlackMessage> {
        self.delivered.lock().expect("lock").clone()
    }

    /// Post links of delivered messages, in delivery order.
    pub fn delivered_links(&self) -> Vec<String> {
        self.delivered()
            .iter()
            .filter_map(|m| link_of(m).map(str::to_string))
            .collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

fn link_of(message: &SlackMessage) -> Option<&str> {
    message.blocks.iter().find_map(|block| match block {
        Block::Actions { elements } => elements.first().map(|b| b.url.as_str()),
        _ => None,
    })
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, message: &SlackMessage) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if link_of(message).is_some_and(|link| self.failing_links.contains(link)) {
            return Err(AppError::Delivery {
                status: 500,
                body: "invalid_payload".to_string(),
            });
        }
        self.delivered.lock().expect("lock").push(message.clone());
        Ok(())
    }
}

/// Watermark kept in memory, with a history of saves.
#[derive(Default)]
pub struct MemoryStore {
    value: Mutex<Option<PostId>>,
    saves: Mutex<Vec<PostId>>,
    corrupt: bool,
}

impl MemoryStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(id: u64) -> Self {
        Self {
            value: Mutex::new(Some(PostId::new(id))),
            ..Self::default()
        }
    }

    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<u64> {
        self.value.lock().expect("lock").map(PostId::value)
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().expect("lock").len()
    }
}

#[async_trait]
impl WatermarkStore for MemoryStore {
    async fn load(&self) -> Result<Option<PostId>> {
        if self.corrupt {
            return Err(AppError::validation("Corrupt watermark in memory: 'x'"));
        }
        Ok(*self.value.lock().expect("lock"))
    }

    async fn save(&self, id: PostId) -> Result<()> {
        *self.value.lock().expect("lock") = Some(id);
        self.saves.lock().expect("lock").push(id);
        Ok(())
    }
}

/// Serves image bytes by URL; unknown URLs fail.
#[derive(Default)]
pub struct FakeFetcher {
    images: HashMap<String, Vec<u8>>,
}

impl FakeFetcher {
    pub fn insert(&mut self, url: &str, bytes: Vec<u8>) {
        self.images.insert(url.to_string(), bytes);
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::image(format!("GET {url} answered 404 Not Found")))
    }
}

/// Image host returning a fixed URL, or always failing.
pub struct FakeHost {
    url: Option<String>,
    uploads: Mutex<Vec<Vec<u8>>>,
}

impl FakeHost {
    pub fn succeeding(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            url: None,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().expect("lock").len()
    }

    pub fn last_upload(&self) -> Option<Vec<u8>> {
        self.uploads.lock().expect("lock").last().cloned()
    }
}

#[async_trait]
impl ImageHost for FakeHost {
    async fn upload(&self, jpeg: Vec<u8>) -> Result<String> {
        self.uploads.lock().expect("lock").push(jpeg);
        self.url
            .clone()
            .ok_or_else(|| AppError::upload("host answered 503 Service Unavailable"))
    }
}
