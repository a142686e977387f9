//! Block-structured webhook message.

use serde::{Deserialize, Serialize};

/// A rich message: blocks plus a plain-text fallback summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlackMessage {
    pub blocks: Vec<Block>,

    /// Plain-text summary shown where blocks cannot be rendered
    pub text: String,
}

impl SlackMessage {
    /// Image URLs referenced by image blocks, in order.
    pub fn image_urls(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Image { image_url, .. } => Some(image_url.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Text of every section block, in order.
    pub fn section_texts(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Section { text } => Some(text.text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// One layout block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: Text },
    Section { text: Text },
    Divider,
    Image { image_url: String, alt_text: String },
    Actions { elements: Vec<Button> },
    Context { elements: Vec<Text> },
}

/// A text object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Text {
    #[serde(rename = "type")]
    pub kind: TextKind,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

impl Text {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::PlainText,
            text: text.into(),
            emoji: Some(true),
        }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::Mrkdwn,
            text: text.into(),
            emoji: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    PlainText,
    Mrkdwn,
}

/// A link button.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Text,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl Button {
    pub fn primary_link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: "button".to_string(),
            text: Text::plain(label),
            url: url.into(),
            style: Some("primary".to_string()),
        }
    }
}
