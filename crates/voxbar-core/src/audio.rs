//! Audio chunk types shared between capture and streaming.

use bytes::Bytes;

/// Levels at or below this are considered silence (in dBFS).
pub const SILENCE_FLOOR_DBFS: f32 = -96.0;

/// One buffer of captured audio, already converted to the streaming
/// format (16-bit signed little-endian PCM, mono).
///
/// The payload is reference-counted, so cloning a chunk to keep it in the
/// session's capture buffer while also forwarding it to the network is O(1).
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Monotonic sequence number within one capture stream, starting at 0.
    pub seq: u64,
    /// PCM16LE mono samples.
    pub data: Bytes,
    /// Peak level of this chunk in dBFS, clamped between
    /// [`SILENCE_FLOOR_DBFS`] and 0.
    pub level_dbfs: f32,
}

impl AudioChunk {
    pub fn new(seq: u64, data: Bytes, level_dbfs: f32) -> Self {
        Self {
            seq,
            data,
            level_dbfs,
        }
    }

    /// Duration of this chunk in samples.
    pub fn sample_count(&self) -> usize {
        self.data.len() / 2
    }

    /// Whether this chunk carries no audible signal.
    pub fn is_silent(&self) -> bool {
        self.level_dbfs <= SILENCE_FLOOR_DBFS
    }
}
