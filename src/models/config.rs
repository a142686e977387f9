//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Largest accepted collage cell, in pixels.
pub const MAX_THUMB_SIZE: u32 = 1024;

/// Largest accepted collage column count.
pub const MAX_COLUMNS: u32 = 16;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which feed to watch
    #[serde(default)]
    pub feed: FeedConfig,

    /// Page fetching and rendering settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Detail page extraction heuristics
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Image pass-through and collage settings
    #[serde(default)]
    pub media: MediaConfig,

    /// Outgoing message wording and transport
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Watermark persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Watermark advancement policy
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, using defaults only when the file does not exist.
    ///
    /// A file that exists but does not parse is an error.
    pub fn load_if_present(path: impl AsRef<Path>) -> Result<Self> {
        match fs::read_to_string(&path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "No config file at {:?}; using defaults.",
                    path.as_ref()
                );
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.feed.channel_id.trim().is_empty() {
            return Err(AppError::validation("feed.channel_id is empty"));
        }
        if self.feed.channel_id.contains('/') {
            return Err(AppError::validation("feed.channel_id must not contain '/'"));
        }
        url::Url::parse(&self.feed.base_url)
            .map_err(|e| AppError::validation(format!("feed.base_url is invalid: {e}")))?;
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.extraction.max_content_blocks == 0 {
            return Err(AppError::validation(
                "extraction.max_content_blocks must be > 0",
            ));
        }
        if self.extraction.menu_max_len == 0 {
            return Err(AppError::validation("extraction.menu_max_len must be > 0"));
        }
        if !(1..=MAX_THUMB_SIZE).contains(&self.media.thumb_size) {
            return Err(AppError::validation(format!(
                "media.thumb_size must be in 1..={MAX_THUMB_SIZE}"
            )));
        }
        if !(1..=MAX_COLUMNS).contains(&self.media.max_columns) {
            return Err(AppError::validation(format!(
                "media.max_columns must be in 1..={MAX_COLUMNS}"
            )));
        }
        if !(1..=100).contains(&self.media.jpeg_quality) {
            return Err(AppError::validation("media.jpeg_quality must be in 1..=100"));
        }
        if self.media.fetch_timeout_secs == 0 || self.media.upload_timeout_secs == 0 {
            return Err(AppError::validation("media timeouts must be > 0"));
        }
        if self.notify.timeout_secs == 0 {
            return Err(AppError::validation("notify.timeout_secs must be > 0"));
        }
        if self.storage.watermark_path.as_os_str().is_empty() {
            return Err(AppError::validation("storage.watermark_path is empty"));
        }
        Ok(())
    }
}

/// Feed location and listing conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Site root, e.g. `https://pf.kakao.com`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Channel identifier; post links look like `/{channel_id}/{post_id}`
    #[serde(default = "defaults::channel_id")]
    pub channel_id: String,

    /// Phrase the source renders next to pinned posts
    #[serde(default = "defaults::pinned_marker")]
    pub pinned_marker: String,

    /// Title used when a listing anchor has no emphasized text
    #[serde(default = "defaults::untitled_placeholder")]
    pub untitled_placeholder: String,

    /// Title used by manual replay when the detail page has none
    #[serde(default = "defaults::replay_title")]
    pub replay_title: String,
}

impl FeedConfig {
    /// URL of the feed listing page.
    pub fn feed_url(&self) -> String {
        format!(
            "{}/{}/posts",
            self.base_url.trim_end_matches('/'),
            self.channel_id
        )
    }

    /// URL of a single post's detail page.
    pub fn post_url(&self, id: impl std::fmt::Display) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.channel_id,
            id
        )
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            channel_id: defaults::channel_id(),
            pinned_marker: defaults::pinned_marker(),
            untitled_placeholder: defaults::untitled_placeholder(),
            replay_title: defaults::replay_title(),
        }
    }
}

/// Which rendering collaborator produces documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Plain HTTP fetch of the served markup; only sees static pages
    Http,
    /// Headless Chromium (requires the `browser` feature)
    #[default]
    Chrome,
}

/// HTTP client and rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for page requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request/navigation timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Wait after navigation before the document is read
    #[serde(default = "defaults::settle_delay")]
    pub settle_delay_ms: u64,

    #[serde(default)]
    pub renderer: RendererKind,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            settle_delay_ms: defaults::settle_delay(),
            renderer: RendererKind::default(),
        }
    }
}

/// Heuristics for pulling content out of a detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// UI chrome labels; text containing any of these is never content
    #[serde(default = "defaults::exclude_keywords")]
    pub exclude_keywords: Vec<String>,

    /// Substrings that disqualify a paragraph as a menu item
    #[serde(default = "defaults::menu_exclude_keywords")]
    pub menu_exclude_keywords: Vec<String>,

    /// Minimum title length in characters
    #[serde(default = "defaults::title_min_len")]
    pub title_min_len: usize,

    /// Minimum body block length in characters
    #[serde(default = "defaults::content_min_len")]
    pub content_min_len: usize,

    /// Maximum number of body blocks joined into the content
    #[serde(default = "defaults::max_content_blocks")]
    pub max_content_blocks: usize,

    /// Maximum menu item length in characters
    #[serde(default = "defaults::menu_max_len")]
    pub menu_max_len: usize,

    /// `alt` text the source puts on content images
    #[serde(default = "defaults::image_alt_marker")]
    pub image_alt_marker: String,
}

impl ExtractionConfig {
    /// True if `text` contains any UI chrome label.
    pub fn is_excluded(&self, text: &str) -> bool {
        self.exclude_keywords.iter().any(|k| text.contains(k.as_str()))
    }

    /// True if `text` contains any menu exclusion substring.
    pub fn is_menu_excluded(&self, text: &str) -> bool {
        self.menu_exclude_keywords
            .iter()
            .any(|k| text.contains(k.as_str()))
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            exclude_keywords: defaults::exclude_keywords(),
            menu_exclude_keywords: defaults::menu_exclude_keywords(),
            title_min_len: defaults::title_min_len(),
            content_min_len: defaults::content_min_len(),
            max_content_blocks: defaults::max_content_blocks(),
            menu_max_len: defaults::menu_max_len(),
            image_alt_marker: defaults::image_alt_marker(),
        }
    }
}

/// Image presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Up to this many images are forwarded without compositing
    #[serde(default = "defaults::pass_through_max")]
    pub pass_through_max: usize,

    /// Square cell size of the collage grid in pixels
    #[serde(default = "defaults::thumb_size")]
    pub thumb_size: u32,

    #[serde(default = "defaults::max_columns")]
    pub max_columns: u32,

    #[serde(default = "defaults::jpeg_quality")]
    pub jpeg_quality: u8,

    /// Canvas background colour (RGB)
    #[serde(default = "defaults::background")]
    pub background: [u8; 3],

    #[serde(default = "defaults::fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// User-Agent sent when downloading source images
    #[serde(default = "defaults::fetch_user_agent")]
    pub fetch_user_agent: String,

    /// Anonymous image host accepting a multipart `file` upload
    #[serde(default = "defaults::upload_url")]
    pub upload_url: String,

    #[serde(default = "defaults::upload_timeout")]
    pub upload_timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            pass_through_max: defaults::pass_through_max(),
            thumb_size: defaults::thumb_size(),
            max_columns: defaults::max_columns(),
            jpeg_quality: defaults::jpeg_quality(),
            background: defaults::background(),
            fetch_timeout_secs: defaults::fetch_timeout(),
            fetch_user_agent: defaults::fetch_user_agent(),
            upload_url: defaults::upload_url(),
            upload_timeout_secs: defaults::upload_timeout(),
        }
    }
}

/// Message wording and webhook transport settings.
///
/// Templates support `{title}`, `{count}` and `{index}` where noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Header text; `{title}`
    #[serde(default = "defaults::header_template")]
    pub header_template: String,

    /// Plain-text fallback summary; `{title}`
    #[serde(default = "defaults::fallback_template")]
    pub fallback_template: String,

    /// Heading placed above the menu item list
    #[serde(default = "defaults::menu_heading")]
    pub menu_heading: String,

    #[serde(default = "defaults::menu_separator")]
    pub menu_separator: String,

    /// Alt text of a pass-through image; `{index}` (1-based)
    #[serde(default = "defaults::image_alt_template")]
    pub image_alt_template: String,

    /// Alt text of a collage image; `{count}`
    #[serde(default = "defaults::composite_alt_template")]
    pub composite_alt_template: String,

    /// Shown instead of images when the collage could not be built; `{count}`
    #[serde(default = "defaults::collage_failed_template")]
    pub collage_failed_template: String,

    /// Shown instead of images when the upload failed; `{count}`
    #[serde(default = "defaults::upload_failed_template")]
    pub upload_failed_template: String,

    #[serde(default = "defaults::button_label")]
    pub button_label: String,

    /// Context footer naming the source
    #[serde(default = "defaults::footer")]
    pub footer: String,

    #[serde(default = "defaults::notify_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            header_template: defaults::header_template(),
            fallback_template: defaults::fallback_template(),
            menu_heading: defaults::menu_heading(),
            menu_separator: defaults::menu_separator(),
            image_alt_template: defaults::image_alt_template(),
            composite_alt_template: defaults::composite_alt_template(),
            collage_failed_template: defaults::collage_failed_template(),
            upload_failed_template: defaults::upload_failed_template(),
            button_label: defaults::button_label(),
            footer: defaults::footer(),
            timeout_secs: defaults::notify_timeout(),
        }
    }
}

/// Watermark persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Plain-text file holding the last delivered post id
    #[serde(default = "defaults::watermark_path")]
    pub watermark_path: PathBuf,

    /// Write through a temp file and rename instead of overwriting in place
    #[serde(default = "defaults::atomic_write")]
    pub atomic_write: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            watermark_path: defaults::watermark_path(),
            atomic_write: defaults::atomic_write(),
        }
    }
}

/// When the watermark moves after a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
    /// Advance to the newest fetched id even if some deliveries failed
    #[default]
    Always,
    /// Advance only through the oldest-first run of successful deliveries
    OnSuccess,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub advance: AdvancePolicy,
}

/// Credentials supplied out-of-band at process start.
#[derive(Clone)]
pub struct Credentials {
    pub webhook_url: String,
}

impl Credentials {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("webhook_url", &"<redacted>")
            .finish()
    }
}

mod defaults {
    use std::path::PathBuf;

    // Feed defaults
    pub fn base_url() -> String {
        "https://pf.kakao.com".into()
    }
    pub fn channel_id() -> String {
        "_FNHuG".into()
    }
    pub fn pinned_marker() -> String {
        "고정됨".into()
    }
    pub fn untitled_placeholder() -> String {
        "Untitled".into()
    }
    pub fn replay_title() -> String {
        "New post".into()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; feed-relay/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn settle_delay() -> u64 {
        3000
    }

    // Extraction defaults
    pub fn exclude_keywords() -> Vec<String> {
        [
            "QR",
            "프로필",
            "댓글",
            "소식",
            "채널홈",
            "폰으로",
            "접속해보세요",
            "고정됨",
            "공유하기",
            "좋아요",
            "카카오톡",
            "더보기",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn menu_exclude_keywords() -> Vec<String> {
        ["채널", "댓글", "접속", "폰으로"]
            .into_iter()
            .map(String::from)
            .collect()
    }
    pub fn title_min_len() -> usize {
        2
    }
    pub fn content_min_len() -> usize {
        3
    }
    pub fn max_content_blocks() -> usize {
        5
    }
    pub fn menu_max_len() -> usize {
        15
    }
    pub fn image_alt_marker() -> String {
        "이미지".into()
    }

    // Media defaults
    pub fn pass_through_max() -> usize {
        2
    }
    pub fn thumb_size() -> u32 {
        150
    }
    pub fn max_columns() -> u32 {
        4
    }
    pub fn jpeg_quality() -> u8 {
        85
    }
    pub fn background() -> [u8; 3] {
        [255, 255, 255]
    }
    pub fn fetch_timeout() -> u64 {
        10
    }
    pub fn fetch_user_agent() -> String {
        "Mozilla/5.0".into()
    }
    pub fn upload_url() -> String {
        "https://0x0.st".into()
    }
    pub fn upload_timeout() -> u64 {
        30
    }

    // Notify defaults
    pub fn header_template() -> String {
        "📢 {title}".into()
    }
    pub fn fallback_template() -> String {
        "New channel post: {title}".into()
    }
    pub fn menu_heading() -> String {
        "*🍽️ Today's menu*".into()
    }
    pub fn menu_separator() -> String {
        " • ".into()
    }
    pub fn image_alt_template() -> String {
        "Menu image {index}".into()
    }
    pub fn composite_alt_template() -> String {
        "Menu images ({count})".into()
    }
    pub fn collage_failed_template() -> String {
        "_{count} images (collage failed)_".into()
    }
    pub fn upload_failed_template() -> String {
        "_{count} images (upload failed)_".into()
    }
    pub fn button_label() -> String {
        "View full post".into()
    }
    pub fn footer() -> String {
        "Kakao channel".into()
    }
    pub fn notify_timeout() -> u64 {
        10
    }

    // Storage defaults
    pub fn watermark_path() -> PathBuf {
        PathBuf::from("last_post.txt")
    }
    pub fn atomic_write() -> bool {
        true
    }
}
