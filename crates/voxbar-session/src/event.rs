//! Session events and outcomes.

use crate::error::SessionError;
use crate::state::SessionState;

/// What a session reports while it runs.
///
/// The event stream is advisory, meant for driving a UI. Delivery of the
/// transcript itself goes through the sinks, never through here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session moved to a new state
    StateChanged(SessionState),
    /// Updated hypothesis for the utterance in progress
    Partial(String),
    /// Another second of recording elapsed
    Tick { elapsed_secs: u64 },
    /// First audible signal seen on the input
    MicActive,
    /// The session reached a terminal state
    Closed(SessionOutcome),
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The final transcript, exactly as handed to the sinks
    Delivered(String),
    /// Cancelled by the user; nothing was delivered
    Cancelled,
    /// Failed; nothing was delivered
    Failed(SessionError),
}
