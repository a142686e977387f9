// src/render/chrome.rs

//! Headless Chromium renderer.
//!
//! One browser and one page are acquired per batch; every render navigates
//! that page, waits for the settle delay and snapshots the DOM.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::render::Renderer;

pub struct ChromeRenderer {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
    settle_delay: Duration,
}

impl ChromeRenderer {
    /// Launch a headless browser and open the batch page.
    pub async fn launch(config: &CrawlerConfig) -> Result<Self> {
        let browser_config = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(config.timeout_secs))
            .arg(format!("--user-agent={}", config.user_agent))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .build()
            .map_err(|e| AppError::config(format!("Failed to build browser config: {e}")))?;

        log::info!("Launching headless browser");
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| AppError::render("about:blank", e))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::debug!("Browser handler error: {:?}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(AppError::render("about:blank", e));
            }
        };

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        })
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        log::debug!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| AppError::render(url, e))?;

        tokio::time::sleep(self.settle_delay).await;

        self.page
            .content()
            .await
            .map_err(|e| AppError::render(url, e))
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            log::debug!("Closing headless browser");
            if let Err(e) = browser.close().await {
                log::warn!("Browser close failed: {}", e);
            }
            let _ = browser.wait().await;
        }
        self.handler.abort();
        Ok(())
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
