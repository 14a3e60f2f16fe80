//! Realtime transcript streaming for voxbar.
//!
//! This crate provides a trait-based abstraction over a bidirectional
//! transcript channel. Audio goes out as binary frames, transcripts come
//! back as JSON text frames. The shipped implementation speaks the
//! AssemblyAI v2 realtime protocol over a WebSocket.

mod channel;
mod config;
mod wire;

use std::time::Duration;

use async_trait::async_trait;
pub use channel::{RealtimeChannel, RealtimeConnector};
pub use config::{ChannelConfig, DEFAULT_ENDPOINT};
use thiserror::Error;
use tokio::sync::mpsc;
use voxbar_core::{AudioChunk, TranscriptEvent};

/// Errors that can occur while opening a transcript channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to open transcript channel: {0}")]
    OpenFailed(String),

    #[error("transcript channel handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;

/// Trait for transcript channel providers.
///
/// Implement this trait to stream against a different endpoint or to
/// substitute a scripted channel in tests.
#[async_trait]
pub trait TranscriptConnector: Send + Sync {
    /// Open a channel. Transcript events arrive on `events` in the order
    /// the endpoint produced them; the sender is dropped once the channel
    /// has ended, which is how consumers learn it is gone.
    async fn open(&self, events: mpsc::Sender<TranscriptEvent>)
    -> Result<Box<dyn TranscriptChannel>>;

    /// Returns the name of this connector for logging/debugging.
    fn name(&self) -> &str;
}

/// Handle to an open transcript channel.
///
/// All methods are fire-and-forget enqueues; failures surface through the
/// event stream ending rather than through return values.
pub trait TranscriptChannel: Send {
    /// Forward one chunk of audio to the endpoint.
    fn send(&mut self, chunk: AudioChunk);

    /// Tell the endpoint no more audio is coming so it can flush trailing
    /// transcripts and close from its side.
    fn finish(&mut self);

    /// Tear the channel down. Safe to call more than once and after the
    /// channel has already ended.
    fn close(&mut self);
}
