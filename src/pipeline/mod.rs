//! Pipeline entry points for the relay.
//!
//! - `Watcher::run`: list the feed, deliver new posts, commit the watermark
//! - `run_replay`: deliver one chosen post and overwrite the watermark

pub mod detect;
pub mod relay;
pub mod replay;
pub mod watch;

pub use detect::{NoChangeReason, Selection, commit_target, select_new_posts};
pub use relay::{PostRelay, PostReport};
pub use replay::{parse_target, run_replay};
pub use watch::{RunOutcome, Watcher};
