//! Microphone capture for voxbar.
//!
//! This crate turns a system input device into a stream of fixed-size
//! [`AudioChunk`]s in the streaming wire format (PCM16LE mono at the
//! configured sample rate), regardless of what format the device itself
//! produces.

mod convert;
mod mic;

use async_trait::async_trait;
pub use mic::Microphone;
use thiserror::Error;
use tokio::sync::mpsc;
use voxbar_core::{AudioChunk, DEFAULT_SAMPLE_RATE};

/// Errors that can occur while acquiring or running a capture stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// generic anyhow error
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    /// No recording device available
    #[error("no input device available")]
    NoInputDevice,
    /// Sample format not supported
    #[error("sample format not supported: {0}")]
    SampleFormatNotSupported(String),
    /// Build stream error
    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),
}

/// Result type for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Duration of one produced chunk in milliseconds.
pub const DEFAULT_CHUNK_MS: u64 = 100;

/// How many chunks may queue up before the producer starts dropping audio.
const CHUNK_QUEUE_DEPTH: usize = 32;

/// Capture parameters describing the chunks a source should produce.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Sample rate of produced chunks (in Hz)
    pub sample_rate: u32,

    /// Duration of one chunk (in milliseconds)
    pub chunk_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            chunk_ms: DEFAULT_CHUNK_MS,
        }
    }
}

impl CaptureConfig {
    /// Create a config producing chunks at the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    /// Set the chunk duration in milliseconds.
    pub fn with_chunk_ms(mut self, chunk_ms: u64) -> Self {
        self.chunk_ms = chunk_ms;
        self
    }

    /// Number of samples in one chunk.
    pub fn chunk_samples(&self) -> usize {
        ((self.sample_rate as u64 * self.chunk_ms / 1000) as usize).max(1)
    }
}

/// Trait for audio input backends.
///
/// Implement this trait to capture from something other than the system
/// microphone (a file player, a test fixture, a remote feed).
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Acquire the input device and start producing chunks.
    ///
    /// The device stays held until the returned stream is dropped.
    async fn acquire(&self) -> Result<CaptureStream>;

    /// Returns the name of this source for logging/debugging.
    fn name(&self) -> &str;
}

/// A live capture stream. Chunks arrive in capture order with
/// monotonically increasing sequence numbers.
///
/// Dropping the stream releases the underlying device.
pub struct CaptureStream {
    chunks: mpsc::Receiver<AudioChunk>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl CaptureStream {
    /// Wrap a chunk receiver together with a release action that runs
    /// when the stream is dropped.
    pub fn with_release(
        chunks: mpsc::Receiver<AudioChunk>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            chunks,
            release: Some(Box::new(release)),
        }
    }

    /// Wrap a plain chunk receiver with no device behind it.
    pub fn from_receiver(chunks: mpsc::Receiver<AudioChunk>) -> Self {
        Self {
            chunks,
            release: None,
        }
    }

    /// Receive the next chunk. Returns `None` once the producer is gone,
    /// which for a device-backed stream means the input stream ended.
    pub async fn next_chunk(&mut self) -> Option<AudioChunk> {
        self.chunks.recv().await
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_chunk_samples() {
        let config = CaptureConfig::new(16_000);
        assert_eq!(config.chunk_samples(), 1600);

        let config = CaptureConfig::new(16_000).with_chunk_ms(20);
        assert_eq!(config.chunk_samples(), 320);
    }

    #[tokio::test]
    async fn test_stream_release_runs_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let (_tx, rx) = mpsc::channel(1);

        let counter = released.clone();
        let stream = CaptureStream::with_release(rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(released.load(Ordering::SeqCst), 0);
        drop(stream);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stream_ends_when_producer_drops() {
        let (tx, rx) = mpsc::channel(4);
        let mut stream = CaptureStream::from_receiver(rx);

        tx.send(AudioChunk::new(0, voxbar_core::Bytes::new(), -30.0))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(stream.next_chunk().await.map(|c| c.seq), Some(0));
        assert!(stream.next_chunk().await.is_none());
    }
}
