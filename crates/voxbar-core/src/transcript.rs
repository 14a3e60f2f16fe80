//! Transcript event types.

/// A transcript produced by the streaming endpoint.
///
/// Partials are advisory previews that later messages revise. Finals are
/// stable and are what ends up in the message editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// In-progress hypothesis for the current utterance.
    Partial(String),
    /// Settled text for a completed utterance.
    Final(String),
}

impl TranscriptEvent {
    pub fn text(&self) -> &str {
        match self {
            Self::Partial(text) | Self::Final(text) => text,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }
}
