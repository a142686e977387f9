// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::{CrawlerConfig, MediaConfig, NotifyConfig};

/// Client used to fetch feed and post pages.
pub fn create_page_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    build(&config.user_agent, config.timeout_secs)
}

/// Client used to download source images.
pub fn create_image_client(config: &MediaConfig) -> Result<reqwest::Client> {
    build(&config.fetch_user_agent, config.fetch_timeout_secs)
}

/// Client used to upload collages to the image host.
pub fn create_upload_client(config: &MediaConfig) -> Result<reqwest::Client> {
    build(&config.fetch_user_agent, config.upload_timeout_secs)
}

/// Client used to post webhook messages.
pub fn create_webhook_client(config: &NotifyConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

fn build(user_agent: &str, timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}
