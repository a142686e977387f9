// src/services/feed.rs

//! Feed lister.
//!
//! Enumerates the posts currently shown on the channel feed.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{FeedConfig, PostId, PostSummary};
use crate::render::Renderer;
use crate::services::parse_selector;
use crate::utils::normalize_whitespace;
use crate::utils::url::{post_id_from_path, resolve_url};

/// Lists posts from the rendered feed page.
pub struct FeedLister<'a> {
    config: &'a FeedConfig,
    base_url: Url,
}

impl<'a> FeedLister<'a> {
    pub fn new(config: &'a FeedConfig) -> Result<Self> {
        let base_url = Url::parse(&config.feed_url())?;
        Ok(Self { config, base_url })
    }

    /// Render the feed and list its posts, newest first.
    ///
    /// A render failure fails the whole listing; there is no partial result.
    pub async fn list(&self, renderer: &dyn Renderer) -> Result<Vec<PostSummary>> {
        let url = self.base_url.as_str();
        log::info!("Loading feed: {}", url);

        let html = renderer.render(url).await?;
        let posts = self.parse(&html)?;

        log::info!("Found {} posts on the feed", posts.len());
        Ok(posts)
    }

    /// Extract posts from feed markup, deduplicated by id, newest first.
    pub fn parse(&self, html: &str) -> Result<Vec<PostSummary>> {
        let document = Html::parse_document(html);
        let anchor_sel = parse_selector("a[href]")?;
        let title_sel = parse_selector("strong")?;

        let mut seen = HashSet::new();
        let mut posts = Vec::new();

        for anchor in document.select(&anchor_sel) {
            let Some(id) = self.anchor_post_id(&anchor) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }

            posts.push(PostSummary {
                id,
                title: self.anchor_title(&anchor, &title_sel),
                link: self.config.post_url(id),
                is_pinned: self.is_pinned(&anchor),
            });
        }

        posts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(posts)
    }

    /// Post id of an anchor pointing at `/{channel_id}/{digits}` on the feed's host.
    fn anchor_post_id(&self, anchor: &ElementRef) -> Option<PostId> {
        let href = anchor.value().attr("href")?;
        let target = resolve_url(&self.base_url, href)?;
        if target.host_str() != self.base_url.host_str() {
            return None;
        }
        post_id_from_path(target.path(), &self.config.channel_id)
    }

    fn anchor_title(&self, anchor: &ElementRef, title_sel: &Selector) -> String {
        anchor
            .select(title_sel)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| self.config.untitled_placeholder.clone())
    }

    /// The pinned marker is rendered as text in the anchor's containing block.
    fn is_pinned(&self, anchor: &ElementRef) -> bool {
        anchor
            .parent()
            .and_then(ElementRef::wrap)
            .map(|parent| {
                parent
                    .text()
                    .collect::<String>()
                    .contains(&self.config.pinned_marker)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lister(config: &FeedConfig) -> FeedLister<'_> {
        FeedLister::new(config).unwrap()
    }

    fn ids(posts: &[PostSummary]) -> Vec<u64> {
        posts.iter().map(|p| p.id.value()).collect()
    }

    const FEED: &str = r#"
        <html><body><main>
          <div class="item">
            <span>고정됨</span>
            <a href="/_FNHuG/100"><strong>공지 안내</strong></a>
          </div>
          <div class="item">
            <a href="/_FNHuG/105"><strong>오늘의 메뉴</strong></a>
            <a href="/_FNHuG/105"><img src="x.jpg"></a>
          </div>
          <div class="item">
            <a href="https://pf.kakao.com/_FNHuG/103"><strong>  어제의
               메뉴 </strong></a>
          </div>
          <div class="item">
            <a href="/_FNHuG/107">사진만 있는 게시글</a>
          </div>
          <a href="/_FNHuG/posts">소식</a>
          <a href="/_FNHuG/abc">not a post</a>
          <a href="/_other/999"><strong>other channel</strong></a>
          <a href="https://elsewhere.example/_FNHuG/998">other host</a>
        </main></body></html>
    "#;

    #[test]
    fn test_parse_orders_newest_first() {
        let config = FeedConfig::default();
        let posts = lister(&config).parse(FEED).unwrap();
        assert_eq!(ids(&posts), vec![107, 105, 103, 100]);
    }

    #[test]
    fn test_duplicate_anchors_yield_one_post() {
        let config = FeedConfig::default();
        let html = r#"<div><a href="/_FNHuG/55"><strong>A</strong></a>
                      <a href="/_FNHuG/55"><strong>B</strong></a></div>"#;
        let posts = lister(&config).parse(html).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, PostId::new(55));
        assert_eq!(posts[0].title, "A");
    }

    #[test]
    fn test_non_numeric_segment_is_skipped() {
        let config = FeedConfig::default();
        let html = r#"<a href="/_FNHuG/abc"><strong>x</strong></a>"#;
        assert!(lister(&config).parse(html).unwrap().is_empty());
    }

    #[test]
    fn test_titles_and_placeholder() {
        let config = FeedConfig::default();
        let posts = lister(&config).parse(FEED).unwrap();
        let by_id = |id: u64| posts.iter().find(|p| p.id.value() == id).unwrap();

        assert_eq!(by_id(105).title, "오늘의 메뉴");
        assert_eq!(by_id(103).title, "어제의 메뉴");
        assert_eq!(by_id(107).title, config.untitled_placeholder);
    }

    #[test]
    fn test_pinned_detection() {
        let config = FeedConfig::default();
        let posts = lister(&config).parse(FEED).unwrap();
        let pinned: Vec<u64> = posts
            .iter()
            .filter(|p| p.is_pinned)
            .map(|p| p.id.value())
            .collect();
        assert_eq!(pinned, vec![100]);
    }

    #[test]
    fn test_links_are_canonical() {
        let config = FeedConfig::default();
        let posts = lister(&config).parse(FEED).unwrap();
        assert_eq!(posts[0].link, "https://pf.kakao.com/_FNHuG/107");
    }

    #[test]
    fn test_empty_document() {
        let config = FeedConfig::default();
        assert!(lister(&config).parse("").unwrap().is_empty());
    }
}
