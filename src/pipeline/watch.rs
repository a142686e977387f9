//! Batch run: list the feed, deliver new posts, commit the watermark.

use crate::error::Result;
use crate::models::{AdvancePolicy, Config, FeedConfig, PostId};
use crate::pipeline::detect::{NoChangeReason, Selection, commit_target, select_new_posts};
use crate::pipeline::relay::{PostRelay, PostReport};
use crate::render::Renderer;
use crate::services::FeedLister;
use crate::storage::WatermarkStore;

/// Summary of one batch run.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Watermark loaded at the start of the run
    pub previous: Option<PostId>,
    /// Number of posts listed on the feed
    pub fetched: usize,
    /// Set when the run ended without delivering
    pub no_change: Option<NoChangeReason>,
    pub reports: Vec<PostReport>,
    /// Watermark written at the end of the run, if any
    pub committed: Option<PostId>,
}

impl RunOutcome {
    pub fn delivered_count(&self) -> usize {
        self.reports.iter().filter(|r| r.delivered()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.reports.len() - self.delivered_count()
    }
}

/// Runs the automatic detection pipeline.
pub struct Watcher<'a> {
    feed: &'a FeedConfig,
    policy: AdvancePolicy,
    store: &'a dyn WatermarkStore,
    relay: &'a PostRelay<'a>,
}

impl<'a> Watcher<'a> {
    pub fn new(config: &'a Config, store: &'a dyn WatermarkStore, relay: &'a PostRelay<'a>) -> Self {
        Self {
            feed: &config.feed,
            policy: config.policy.advance,
            store,
            relay,
        }
    }

    /// Run one batch. The renderer is closed on every exit path.
    pub async fn run(&self, renderer: &dyn Renderer) -> Result<RunOutcome> {
        let result = self.run_batch(renderer).await;
        if let Err(e) = renderer.close().await {
            log::warn!("Failed to release renderer: {}", e);
        }
        result
    }

    async fn run_batch(&self, renderer: &dyn Renderer) -> Result<RunOutcome> {
        let previous = self.store.load().await?;
        match previous {
            Some(id) => log::info!("Last relayed post: {}", id),
            None => log::info!("No watermark found; this is a first run"),
        }

        let fetched = FeedLister::new(self.feed)?.list(renderer).await?;
        let mut outcome = RunOutcome {
            previous,
            fetched: fetched.len(),
            ..RunOutcome::default()
        };

        let selection = select_new_posts(&fetched, previous);
        match &selection {
            Selection::NoChange(reason) => {
                log::info!("No new posts ({:?})", reason);
                outcome.no_change = Some(*reason);
                return Ok(outcome);
            }
            Selection::FirstRun(post) => {
                log::info!("First run: relaying only the latest post {}", post.id);
            }
            Selection::Backfill(posts) => {
                log::info!("{} new posts to relay", posts.len());
            }
        }

        for post in selection.posts() {
            let report = self.relay.relay(renderer, post.id, &post.title).await;
            outcome.reports.push(report);
        }

        let deliveries: Vec<(PostId, bool)> = outcome
            .reports
            .iter()
            .map(|r| (r.id, r.delivered()))
            .collect();

        match commit_target(&fetched, previous, &deliveries, self.policy) {
            Some(target) => {
                self.store.save(target).await?;
                log::info!("Watermark advanced to {}", target);
                outcome.committed = Some(target);
            }
            None => log::warn!("Watermark left at {:?}", previous),
        }

        if outcome.failed_count() > 0 {
            log::warn!(
                "{} of {} deliveries failed",
                outcome.failed_count(),
                outcome.reports.len()
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::AppError;
    use crate::models::{MediaConfig, PolicyConfig};
    use crate::services::MediaCompositor;
    use crate::testing::{
        FakeFetcher, FakeHost, FakeRenderer, MemoryStore, RecordingNotifier, png_bytes,
        post_html,
    };

    fn compositor(fetcher: FakeFetcher, host: FakeHost) -> MediaCompositor {
        MediaCompositor::new(MediaConfig::default(), Arc::new(fetcher), Arc::new(host))
    }

    fn site(config: &Config, posts: &[(u64, &str, bool)]) -> FakeRenderer {
        posts.iter().fold(
            FakeRenderer::new().with_feed(&config.feed, posts),
            |renderer, (id, title, _)| {
                renderer.with_page(config.feed.post_url(id), post_html(title, "본문 내용입니다", &[]))
            },
        )
    }

    async fn run(
        config: &Config,
        store: &MemoryStore,
        notifier: &RecordingNotifier,
        renderer: &FakeRenderer,
    ) -> Result<RunOutcome> {
        let media = compositor(FakeFetcher::default(), FakeHost::failing());
        run_with_media(config, store, notifier, renderer, &media).await
    }

    async fn run_with_media(
        config: &Config,
        store: &MemoryStore,
        notifier: &RecordingNotifier,
        renderer: &FakeRenderer,
        media: &MediaCompositor,
    ) -> Result<RunOutcome> {
        let relay = PostRelay::new(config, media, notifier);
        Watcher::new(config, store, &relay).run(renderer).await
    }

    const FEED: [(u64, &str, bool); 4] = [
        (107, "목요일 메뉴", false),
        (105, "수요일 메뉴", false),
        (103, "화요일 메뉴", false),
        (101, "월요일 메뉴", false),
    ];

    #[tokio::test]
    async fn test_backfill_delivers_oldest_first() {
        let config = Config::default();
        let store = MemoryStore::with(103);
        let notifier = RecordingNotifier::new();
        let renderer = site(&config, &FEED);

        let outcome = run(&config, &store, &notifier, &renderer).await.unwrap();

        assert_eq!(
            notifier.delivered_links(),
            vec![config.feed.post_url(105), config.feed.post_url(107)]
        );
        assert_eq!(outcome.committed, Some(PostId::new(107)));
        assert_eq!(store.current(), Some(107));
        assert_eq!(renderer.close_count(), 1);
    }

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let config = Config::default();
        let store = MemoryStore::with(107);
        let notifier = RecordingNotifier::new();
        let renderer = site(&config, &FEED);

        let outcome = run(&config, &store, &notifier, &renderer).await.unwrap();

        assert_eq!(outcome.no_change, Some(NoChangeReason::UpToDate));
        assert_eq!(notifier.attempts(), 0);
        assert_eq!(store.save_count(), 0);
        assert_eq!(store.current(), Some(107));
    }

    #[tokio::test]
    async fn test_first_run_delivers_one_post() {
        let config = Config::default();
        let store = MemoryStore::empty();
        let notifier = RecordingNotifier::new();
        let posts = [(110, "고정 공지", true), (107, "목요일 메뉴", false), (105, "수요일 메뉴", false)];
        let renderer = site(&config, &posts);

        let outcome = run(&config, &store, &notifier, &renderer).await.unwrap();

        assert_eq!(notifier.delivered_links(), vec![config.feed.post_url(107)]);
        assert_eq!(outcome.committed, Some(PostId::new(110)));
        assert_eq!(store.current(), Some(110));
    }

    #[tokio::test]
    async fn test_delivery_failure_still_advances_by_default() {
        let config = Config::default();
        let store = MemoryStore::with(103);
        let notifier = RecordingNotifier::new().failing_for(config.feed.post_url(105));
        let renderer = site(&config, &FEED);

        let outcome = run(&config, &store, &notifier, &renderer).await.unwrap();

        assert_eq!(notifier.attempts(), 2);
        assert_eq!(outcome.failed_count(), 1);
        assert_eq!(store.current(), Some(107));
    }

    #[tokio::test]
    async fn test_on_success_policy_holds_watermark() {
        let config = Config {
            policy: PolicyConfig {
                advance: AdvancePolicy::OnSuccess,
            },
            ..Config::default()
        };
        let store = MemoryStore::with(101);
        let notifier = RecordingNotifier::new().failing_for(config.feed.post_url(105));
        let renderer = site(&config, &FEED);

        let outcome = run(&config, &store, &notifier, &renderer).await.unwrap();

        assert_eq!(notifier.attempts(), 3);
        assert_eq!(outcome.delivered_count(), 2);
        assert_eq!(outcome.committed, Some(PostId::new(103)));
        assert_eq!(store.current(), Some(103));
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_and_closes() {
        let config = Config::default();
        let store = MemoryStore::with(103);
        let notifier = RecordingNotifier::new();
        let renderer = FakeRenderer::new().failing_on(config.feed.feed_url());

        let result = run(&config, &store, &notifier, &renderer).await;

        assert!(matches!(result, Err(AppError::Render { .. })));
        assert_eq!(store.save_count(), 0);
        assert_eq!(notifier.attempts(), 0);
        assert_eq!(renderer.close_count(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_watermark_aborts() {
        let config = Config::default();
        let store = MemoryStore::corrupt();
        let notifier = RecordingNotifier::new();
        let renderer = site(&config, &FEED);

        let result = run(&config, &store, &notifier, &renderer).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(renderer.rendered().is_empty());
        assert_eq!(renderer.close_count(), 1);
    }

    #[tokio::test]
    async fn test_detail_render_failure_does_not_abort() {
        let config = Config::default();
        let store = MemoryStore::with(103);
        let notifier = RecordingNotifier::new();
        let renderer = site(&config, &FEED).failing_on(config.feed.post_url(105));

        let outcome = run(&config, &store, &notifier, &renderer).await.unwrap();

        assert_eq!(outcome.delivered_count(), 2);
        assert_eq!(outcome.reports[0].title, "수요일 메뉴");
        assert_eq!(store.current(), Some(107));
    }

    #[tokio::test]
    async fn test_collage_upload_failure_relays_image_count() {
        let config = Config::default();
        let store = MemoryStore::with(105);
        let notifier = RecordingNotifier::new();

        let images: Vec<String> = (0..5)
            .map(|i| format!("https://img.test/{i}.png"))
            .collect();
        let mut fetcher = FakeFetcher::default();
        for url in &images {
            fetcher.insert(url, png_bytes(60, 40));
        }
        let sources: Vec<&str> = images.iter().map(String::as_str).collect();
        let renderer = FakeRenderer::new()
            .with_feed(&config.feed, &FEED)
            .with_page(
                config.feed.post_url(107),
                post_html("목요일 메뉴", "본문 내용입니다", &sources),
            );
        let media = compositor(fetcher, FakeHost::failing());

        let outcome = run_with_media(&config, &store, &notifier, &renderer, &media)
            .await
            .unwrap();

        assert_eq!(outcome.delivered_count(), 1);
        let delivered = notifier.delivered();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0]
            .section_texts()
            .iter()
            .any(|text| text.contains("5 images")));
        assert!(delivered[0].image_urls().is_empty());
        assert_eq!(store.current(), Some(107));
    }
}
