//! Session lifecycle states.

/// The lifecycle state of a recording session.
///
/// States only move forward. The three terminal states describe how the
/// session ended; everything else is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created but not yet doing any work
    Idle,
    /// Waiting for the input device to be granted
    RequestingDevice,
    /// Audio is flowing and transcripts are accumulating
    Recording,
    /// Recording is over; waiting for trailing transcripts
    Finalizing,
    /// The final transcript was handed to the sinks
    Delivered,
    /// Abandoned by the user; nothing was delivered
    Cancelled,
    /// Ended with an error; nothing was delivered
    Failed,
}

impl SessionState {
    /// Whether this state ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(SessionState::Delivered.is_terminal());
        assert!(SessionState::Cancelled.is_terminal());
        assert!(SessionState::Failed.is_terminal());

        assert!(!SessionState::Idle.is_terminal());
        assert!(!SessionState::RequestingDevice.is_terminal());
        assert!(!SessionState::Recording.is_terminal());
        assert!(!SessionState::Finalizing.is_terminal());
    }
}
