// src/services/hosting.rs

//! Anonymous image hosting for generated collages.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::error::{AppError, Result};
use crate::models::MediaConfig;
use crate::utils::http::create_upload_client;

/// Accepts encoded image bytes and returns a public URL for them.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, jpeg: Vec<u8>) -> Result<String>;
}

/// Uploads to a 0x0.st-compatible endpoint.
///
/// The service takes a multipart form with a single `file` part and answers
/// `200` with the hosted URL as the plain-text body.
pub struct ZeroXZeroHost {
    client: reqwest::Client,
    endpoint: String,
}

impl ZeroXZeroHost {
    pub fn new(config: &MediaConfig) -> Result<Self> {
        Ok(Self {
            client: create_upload_client(config)?,
            endpoint: config.upload_url.clone(),
        })
    }
}

#[async_trait]
impl ImageHost for ZeroXZeroHost {
    async fn upload(&self, jpeg: Vec<u8>) -> Result<String> {
        let size = jpeg.len();
        let part = Part::bytes(jpeg)
            .file_name("collage.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new().part("file", part);

        log::debug!("Uploading collage ({} bytes) to {}", size, self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(AppError::upload)?;

        let status = response.status();
        let body = response.text().await.map_err(AppError::upload)?;
        if status != reqwest::StatusCode::OK {
            return Err(AppError::upload(format!("host answered {status}: {}", body.trim())));
        }

        let url = body.trim();
        if url.is_empty() {
            return Err(AppError::upload("host answered with an empty body"));
        }
        Ok(url.to_string())
    }
}
