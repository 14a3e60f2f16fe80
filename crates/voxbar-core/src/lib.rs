//! Core types and configuration for voxbar.
//!
//! This crate provides platform-agnostic types that can be used across
//! all voxbar sub-crates.

mod audio;
mod config;
mod ticker;
mod transcript;

pub use audio::{AudioChunk, SILENCE_FLOOR_DBFS};
pub use bytes::Bytes;
pub use config::{Config, ConfigManager, DEFAULT_SAMPLE_RATE};
pub use ticker::{format_ticker, format_ticker_with_limit};
pub use transcript::TranscriptEvent;

/// Application name
pub const APP_NAME: &str = "voxbar";

/// Pretty application name for display
pub const APP_NAME_PRETTY: &str = "Voxbar";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";
