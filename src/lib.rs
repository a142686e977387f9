// src/lib.rs

//! Kakao channel feed relay library.
//!
//! Watches one channel feed, detects posts newer than a persisted watermark
//! and relays each as a block-structured webhook message.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod testing;
