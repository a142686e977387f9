//! Manual single-post replay.
//!
//! An operator escape hatch: delivers one post regardless of the watermark and
//! then sets the watermark to that post's id, even if it moves backwards.

use crate::error::{AppError, Result};
use crate::models::{FeedConfig, PostId};
use crate::pipeline::relay::{PostRelay, PostReport};
use crate::render::Renderer;
use crate::storage::WatermarkStore;
use crate::utils::parse_post_id;

/// Parse a replay target: a bare numeric id or a post URL ending in one.
pub fn parse_target(input: &str) -> Result<PostId> {
    parse_post_id(input).ok_or_else(|| AppError::InvalidPostId(input.trim().to_string()))
}

/// Relay `id` unconditionally and overwrite the watermark with it.
///
/// The renderer is closed on every exit path.
pub async fn run_replay(
    id: PostId,
    feed: &FeedConfig,
    relay: &PostRelay<'_>,
    store: &dyn WatermarkStore,
    renderer: &dyn Renderer,
) -> Result<PostReport> {
    log::info!("Replaying post {}", id);
    let report = relay.relay(renderer, id, &feed.replay_title).await;

    if let Err(e) = renderer.close().await {
        log::warn!("Failed to release renderer: {}", e);
    }

    store.save(id).await?;
    log::info!("Watermark set to {}", id);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{Block, Config, MediaConfig};
    use crate::services::MediaCompositor;
    use crate::testing::{
        FakeFetcher, FakeHost, FakeRenderer, MemoryStore, RecordingNotifier, post_html,
    };

    fn compositor() -> MediaCompositor {
        MediaCompositor::new(
            MediaConfig::default(),
            Arc::new(FakeFetcher::default()),
            Arc::new(FakeHost::failing()),
        )
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("111555915").unwrap(), PostId::new(111_555_915));
        assert_eq!(
            parse_target("https://pf.kakao.com/_FNHuG/111555915").unwrap(),
            PostId::new(111_555_915)
        );
        assert!(matches!(
            parse_target("https://pf.kakao.com/_FNHuG"),
            Err(AppError::InvalidPostId(_))
        ));
    }

    #[tokio::test]
    async fn test_replay_overwrites_watermark_backwards() {
        let config = Config::default();
        let media = compositor();
        let notifier = RecordingNotifier::new();
        let relay = PostRelay::new(&config, &media, &notifier);
        let store = MemoryStore::with(200);
        let renderer = FakeRenderer::new()
            .with_page(config.feed.post_url(150), post_html("지난 메뉴", "다시 보내기", &[]));

        let report = run_replay(PostId::new(150), &config.feed, &relay, &store, &renderer)
            .await
            .unwrap();

        assert!(report.delivered());
        assert_eq!(store.current(), Some(150));
        assert_eq!(renderer.close_count(), 1);
        assert_eq!(renderer.rendered(), vec![config.feed.post_url(150)]);
    }

    #[tokio::test]
    async fn test_replay_untitled_uses_placeholder() {
        let config = Config::default();
        let media = compositor();
        let notifier = RecordingNotifier::new();
        let relay = PostRelay::new(&config, &media, &notifier);
        let store = MemoryStore::empty();
        let renderer = FakeRenderer::new().failing_on(config.feed.post_url(3));

        let report = run_replay(PostId::new(3), &config.feed, &relay, &store, &renderer)
            .await
            .unwrap();

        assert_eq!(report.title, config.feed.replay_title);
        match &notifier.delivered()[0].blocks[0] {
            Block::Header { text } => assert_eq!(text.text, "📢 New post"),
            other => panic!("unexpected block {other:?}"),
        }
        assert_eq!(store.current(), Some(3));
    }

    #[tokio::test]
    async fn test_replay_saves_even_when_delivery_fails() {
        let config = Config::default();
        let media = compositor();
        let notifier = RecordingNotifier::new().failing_for(config.feed.post_url(4));
        let relay = PostRelay::new(&config, &media, &notifier);
        let store = MemoryStore::empty();
        let renderer = FakeRenderer::new();

        let report = run_replay(PostId::new(4), &config.feed, &relay, &store, &renderer)
            .await
            .unwrap();

        assert!(!report.delivered());
        assert_eq!(store.current(), Some(4));
    }
}
