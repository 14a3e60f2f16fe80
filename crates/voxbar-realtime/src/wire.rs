//! AssemblyAI v2 realtime wire format.

use serde::Deserialize;
use tracing::{debug, warn};
use voxbar_core::TranscriptEvent;

const MESSAGE_TYPE_PARTIAL: &str = "PartialTranscript";
const MESSAGE_TYPE_FINAL: &str = "FinalTranscript";

/// Inbound frame shape. The endpoint sends more fields (timestamps,
/// word confidences, session metadata); only these two matter here.
#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(default)]
    message_type: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Parse one text frame from the endpoint into a transcript event.
///
/// Non-transcript frames (session lifecycle messages, empty hypotheses,
/// malformed payloads) yield `None` and never tear the channel down.
pub(crate) fn parse_transcript(raw: &str) -> Option<TranscriptEvent> {
    let message: InboundMessage = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "ignoring malformed frame from endpoint");
            return None;
        }
    };

    let text = message.text.unwrap_or_default();
    if text.is_empty() {
        return None;
    }

    match message.message_type.as_deref() {
        Some(MESSAGE_TYPE_PARTIAL) => Some(TranscriptEvent::Partial(text)),
        Some(MESSAGE_TYPE_FINAL) => Some(TranscriptEvent::Final(text)),
        other => {
            debug!(message_type = ?other, "ignoring non-transcript message");
            None
        }
    }
}

/// The frame that asks the endpoint to flush trailing transcripts and
/// close the session from its side.
pub(crate) fn terminate_frame() -> String {
    serde_json::json!({ "terminate_session": true }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial() {
        let event = parse_transcript(r#"{"message_type":"PartialTranscript","text":"hel"}"#);
        assert_eq!(event, Some(TranscriptEvent::Partial("hel".to_string())));
    }

    #[test]
    fn test_parse_final() {
        let event = parse_transcript(r#"{"message_type":"FinalTranscript","text":"hello."}"#);
        assert_eq!(event, Some(TranscriptEvent::Final("hello.".to_string())));
    }

    #[test]
    fn test_extra_fields_tolerated() {
        let raw = r#"{
            "message_type": "FinalTranscript",
            "text": "hello",
            "audio_start": 0,
            "audio_end": 1500,
            "confidence": 0.98,
            "punctuated": true
        }"#;
        assert_eq!(
            parse_transcript(raw),
            Some(TranscriptEvent::Final("hello".to_string()))
        );
    }

    #[test]
    fn test_empty_text_dropped() {
        assert_eq!(
            parse_transcript(r#"{"message_type":"PartialTranscript","text":""}"#),
            None
        );
        assert_eq!(
            parse_transcript(r#"{"message_type":"FinalTranscript","text":""}"#),
            None
        );
    }

    #[test]
    fn test_lifecycle_messages_dropped() {
        assert_eq!(
            parse_transcript(r#"{"message_type":"SessionBegins","session_id":"abc"}"#),
            None
        );
        assert_eq!(
            parse_transcript(r#"{"message_type":"SessionTerminated"}"#),
            None
        );
    }

    #[test]
    fn test_unknown_type_with_text_dropped() {
        assert_eq!(
            parse_transcript(r#"{"message_type":"SomethingNew","text":"hi"}"#),
            None
        );
    }

    #[test]
    fn test_missing_type_dropped() {
        assert_eq!(parse_transcript(r#"{"text":"hi"}"#), None);
    }

    #[test]
    fn test_malformed_frame_dropped() {
        assert_eq!(parse_transcript("not json at all"), None);
        assert_eq!(parse_transcript(r#"{"message_type": 42}"#), None);
        assert_eq!(parse_transcript(""), None);
    }

    #[test]
    fn test_terminate_frame_shape() {
        let value: serde_json::Value = serde_json::from_str(&terminate_frame()).unwrap();
        assert_eq!(value["terminate_session"], true);
    }
}
