// src/models/mod.rs

//! Domain models for the relay.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod media;
mod message;
mod post;

// Re-export all public types
pub use config::{
    AdvancePolicy, Config, CrawlerConfig, Credentials, ExtractionConfig, FeedConfig, MediaConfig,
    NotifyConfig, PolicyConfig, RendererKind, StorageConfig,
};
pub use media::{CompositeMedia, MediaFailure};
pub use message::{Block, Button, SlackMessage, Text, TextKind};
pub use post::{MenuItem, PostDetail, PostId, PostSummary};
