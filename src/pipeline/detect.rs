//! Change detection against the stored watermark.
//!
//! Decides which fetched posts are new and where the watermark moves once the
//! batch has been processed. Pure functions over already-listed summaries.

use crate::models::{AdvancePolicy, PostId, PostSummary};

/// Why a run ends without delivering anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoChangeReason {
    /// The feed listed no posts
    EmptyFeed,
    /// No listed post is newer than the watermark
    UpToDate,
}

/// Posts selected for delivery in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    NoChange(NoChangeReason),

    /// No watermark yet: only the newest non-pinned post is delivered.
    FirstRun(PostSummary),

    /// Every post newer than the watermark, oldest first.
    Backfill(Vec<PostSummary>),
}

impl Selection {
    /// Posts to deliver, in delivery order.
    pub fn posts(&self) -> Vec<&PostSummary> {
        match self {
            Self::NoChange(_) => Vec::new(),
            Self::FirstRun(post) => vec![post],
            Self::Backfill(posts) => posts.iter().collect(),
        }
    }

    pub fn is_no_change(&self) -> bool {
        matches!(self, Self::NoChange(_))
    }
}

/// Select the posts to deliver given the fetched feed and the watermark.
///
/// `fetched` may be in any order.
pub fn select_new_posts(fetched: &[PostSummary], watermark: Option<PostId>) -> Selection {
    if fetched.is_empty() {
        return Selection::NoChange(NoChangeReason::EmptyFeed);
    }

    match watermark {
        None => {
            let mut newest_first: Vec<&PostSummary> = fetched.iter().collect();
            newest_first.sort_by(|a, b| b.id.cmp(&a.id));

            let chosen = newest_first
                .iter()
                .find(|post| !post.is_pinned)
                .or_else(|| newest_first.first());

            match chosen {
                Some(post) => Selection::FirstRun((*post).clone()),
                None => Selection::NoChange(NoChangeReason::EmptyFeed),
            }
        }
        Some(watermark) => {
            let mut new_posts: Vec<PostSummary> = fetched
                .iter()
                .filter(|post| post.id > watermark)
                .cloned()
                .collect();

            if new_posts.is_empty() {
                return Selection::NoChange(NoChangeReason::UpToDate);
            }

            new_posts.sort_by_key(|post| post.id);
            Selection::Backfill(new_posts)
        }
    }
}

/// Newest id in the fetched list.
pub fn newest_id(fetched: &[PostSummary]) -> Option<PostId> {
    fetched.iter().map(|post| post.id).max()
}

/// Watermark to persist after a batch, or `None` to leave it untouched.
///
/// `deliveries` lists each attempted post with its delivery result, in
/// delivery order. The result never moves below `watermark`.
pub fn commit_target(
    fetched: &[PostSummary],
    watermark: Option<PostId>,
    deliveries: &[(PostId, bool)],
    policy: AdvancePolicy,
) -> Option<PostId> {
    let newest = newest_id(fetched)?;

    let target = match policy {
        AdvancePolicy::Always => newest,
        AdvancePolicy::OnSuccess => {
            if deliveries.iter().all(|(_, delivered)| *delivered) {
                newest
            } else {
                deliveries
                    .iter()
                    .take_while(|(_, delivered)| *delivered)
                    .map(|(id, _)| *id)
                    .last()?
            }
        }
    };

    match watermark {
        Some(current) if target <= current => None,
        _ => Some(target),
    }
}
