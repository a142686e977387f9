//! Watermark persistence.
//!
//! The watermark is the id of the newest post already relayed. It is a single
//! decimal integer stored as plain text; an absent or empty store means the
//! relay has never run.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::PostId;

// Re-export for convenience
pub use local::FileWatermarkStore;

/// Trait for watermark storage backends.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Load the stored watermark. `None` means no prior run.
    ///
    /// Unparseable content is an error, never silently treated as a first run.
    async fn load(&self) -> Result<Option<PostId>>;

    /// Overwrite the stored watermark.
    async fn save(&self, id: PostId) -> Result<()>;
}
