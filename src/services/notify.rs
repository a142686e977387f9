// src/services/notify.rs

//! Webhook message composition and delivery.

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{
    Block, Button, CompositeMedia, Credentials, MediaFailure, NotifyConfig, PostDetail,
    SlackMessage, Text,
};
use crate::utils::http::create_webhook_client;
use crate::utils::{fill_template, truncate_chars};

/// Header text limit imposed by the transport, ellipsis included.
const HEADER_MAX_CHARS: usize = 150;

/// Delivers composed messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: &SlackMessage) -> Result<()>;
}

/// Posts messages to an incoming-webhook URL.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(config: &NotifyConfig, credentials: &Credentials) -> Result<Self> {
        Ok(Self {
            client: create_webhook_client(config)?,
            webhook_url: credentials.webhook_url.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn deliver(&self, message: &SlackMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Delivery {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Compose the block message for one post.
///
/// Layout: header, optional body, optional menu list, optional media, then a
/// divider, a button linking to the post and a footer.
pub fn build_message(
    title: &str,
    link: &str,
    detail: &PostDetail,
    media: &CompositeMedia,
    config: &NotifyConfig,
) -> SlackMessage {
    let header = fill_template(&config.header_template, &[("title", title)]);
    let mut blocks = vec![Block::Header {
        text: Text::plain(truncate_chars(&header, HEADER_MAX_CHARS)),
    }];

    if !detail.content.is_empty() {
        blocks.push(Block::Section {
            text: Text::mrkdwn(detail.content.clone()),
        });
    }

    let menu_names = detail.menu_names();
    if !menu_names.is_empty() {
        blocks.push(Block::Divider);
        blocks.push(Block::Section {
            text: Text::mrkdwn(format!(
                "{}\n{}",
                config.menu_heading,
                menu_names.join(config.menu_separator.as_str())
            )),
        });
    }

    push_media(&mut blocks, media, config);

    blocks.push(Block::Divider);
    blocks.push(Block::Actions {
        elements: vec![Button::primary_link(&config.button_label, link)],
    });
    blocks.push(Block::Context {
        elements: vec![Text::mrkdwn(config.footer.clone())],
    });

    SlackMessage {
        blocks,
        text: fill_template(&config.fallback_template, &[("title", title)]),
    }
}

fn push_media(blocks: &mut Vec<Block>, media: &CompositeMedia, config: &NotifyConfig) {
    match media {
        CompositeMedia::None => {}
        CompositeMedia::PassThrough(urls) => {
            blocks.push(Block::Divider);
            for (i, url) in urls.iter().enumerate() {
                let index = (i + 1).to_string();
                blocks.push(Block::Image {
                    image_url: url.clone(),
                    alt_text: fill_template(&config.image_alt_template, &[("index", &index)]),
                });
            }
        }
        CompositeMedia::Composite { url, count, .. } => {
            let count = count.to_string();
            blocks.push(Block::Divider);
            blocks.push(Block::Image {
                image_url: url.clone(),
                alt_text: fill_template(&config.composite_alt_template, &[("count", &count)]),
            });
        }
        CompositeMedia::TextOnly { count, reason } => {
            let template = match reason {
                MediaFailure::CollageFailed => &config.collage_failed_template,
                MediaFailure::UploadFailed => &config.upload_failed_template,
            };
            let count = count.to_string();
            blocks.push(Block::Divider);
            blocks.push(Block::Section {
                text: Text::mrkdwn(fill_template(template, &[("count", &count)])),
            });
        }
    }
}
