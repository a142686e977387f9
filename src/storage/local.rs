//! Local filesystem watermark store.
//!
//! The file holds the decimal id and nothing else. Writes go through a
//! temporary sibling file and a rename unless `atomic_write` is disabled.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{PostId, StorageConfig};
use crate::storage::WatermarkStore;

/// Plain-text file watermark store.
#[derive(Debug, Clone)]
pub struct FileWatermarkStore {
    path: PathBuf,
    atomic: bool,
}

impl FileWatermarkStore {
    /// Create a store writing atomically to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            atomic: true,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            path: config.watermark_path.clone(),
            atomic: config.atomic_write,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl WatermarkStore for FileWatermarkStore {
    async fn load(&self) -> Result<Option<PostId>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Io(e)),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        trimmed.parse::<PostId>().map(Some).map_err(|_| {
            AppError::validation(format!(
                "Corrupt watermark in {}: '{}'",
                self.path.display(),
                trimmed
            ))
        })
    }

    async fn save(&self, id: PostId) -> Result<()> {
        self.ensure_dir().await?;
        let bytes = id.to_string();

        if self.atomic {
            let tmp = self.path.with_extension("tmp");
            Self::write_file(&tmp, bytes.as_bytes()).await?;
            tokio::fs::rename(&tmp, &self.path).await?;
        } else {
            Self::write_file(&self.path, bytes.as_bytes()).await?;
        }

        log::debug!("Watermark {} written to {}", id, self.path.display());
        Ok(())
    }
}
