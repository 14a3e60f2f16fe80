//! Session error taxonomy.

use thiserror::Error;

/// Ways a session can fail.
///
/// Reaching the recording ceiling is deliberately absent: it stops the
/// session the same way a user stop does and can still deliver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Input device missing, permission refused, or lost mid-recording.
    #[error("audio input unavailable: {0}")]
    DeviceUnavailable(String),

    /// The transcript channel never became usable.
    #[error("failed to open transcript channel: {0}")]
    ChannelOpenFailed(String),

    /// The channel ended before any final transcript arrived.
    #[error("transcript channel closed before a final transcript arrived")]
    ChannelClosedPrematurely,

    /// A start was attempted while another session is live.
    #[error("a recording session is already active")]
    SessionActive,
}
