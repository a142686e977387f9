// src/render/http.rs

//! Renderer backed by a plain HTTP fetch.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::render::Renderer;
use crate::utils::http::create_page_client;

/// Fetches served markup without executing scripts.
pub struct HttpRenderer {
    client: reqwest::Client,
    settle_delay: Duration,
}

impl HttpRenderer {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_page_client(config)?,
            settle_delay: Duration::ZERO,
        })
    }

    /// Wait this long after each response before returning it.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::render(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::render(url, format!("status {status}")));
        }

        let html = response.text().await.map_err(|e| AppError::render(url, e))?;
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(html)
    }
}
