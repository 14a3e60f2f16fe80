//! Single-session ownership.

use std::sync::Arc;

use tokio::sync::mpsc;
use voxbar_capture::AudioSource;
use voxbar_realtime::TranscriptConnector;

use crate::error::SessionError;
use crate::event::SessionEvent;
use crate::session::{SessionConfig, SessionHandle, start_session};
use crate::sink::{EditorSink, MessageSink};

/// Holds at most one live session at a time.
///
/// The slot owns the shared pieces every session needs (audio source,
/// connector, event stream) and refuses to start a second session while
/// one is still running.
pub struct SessionSlot {
    config: SessionConfig,
    source: Arc<dyn AudioSource>,
    connector: Arc<dyn TranscriptConnector>,
    events: mpsc::UnboundedSender<SessionEvent>,
    current: Option<SessionHandle>,
}

impl SessionSlot {
    pub fn new(
        config: SessionConfig,
        source: Arc<dyn AudioSource>,
        connector: Arc<dyn TranscriptConnector>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            config,
            source,
            connector,
            events,
            current: None,
        }
    }

    /// Start a session unless one is already live.
    pub fn start(
        &mut self,
        editor: Box<dyn EditorSink>,
        dispatch: Box<dyn MessageSink>,
    ) -> Result<&SessionHandle, SessionError> {
        if self.active().is_some() {
            return Err(SessionError::SessionActive);
        }
        let handle = start_session(
            self.config.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.connector),
            editor,
            dispatch,
            self.events.clone(),
        );
        Ok(self.current.insert(handle))
    }

    /// The running session, if any.
    pub fn active(&self) -> Option<&SessionHandle> {
        self.current.as_ref().filter(|handle| !handle.is_finished())
    }

    /// Give up the handle, live or not.
    pub fn take(&mut self) -> Option<SessionHandle> {
        self.current.take()
    }
}
