//! The session runner.
//!
//! One spawned task drives a session from device acquisition to a
//! terminal state. The task owns every piece of mutable session state,
//! including the ceiling timer, so a timer can never fire into a session
//! other than the one that armed it. Stop and cancel are messages, not
//! method calls, and are only honored while recording; once finalization
//! starts the command queue is no longer read.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Context;
use tokio::select;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, sleep, sleep_until};
use tracing::{debug, info, warn};
use voxbar_capture::{AudioSource, CaptureStream};
use voxbar_core::{AudioChunk, TranscriptEvent};
use voxbar_realtime::{TranscriptChannel, TranscriptConnector};

use crate::error::SessionError;
use crate::event::{SessionEvent, SessionOutcome};
use crate::sink::{EditorSink, MessageSink};
use crate::state::SessionState;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

const TICK_PERIOD: Duration = Duration::from_secs(1);
const TRANSCRIPT_QUEUE_DEPTH: usize = 64;

/// Timing parameters for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hard ceiling on recording duration
    pub max_record: Duration,

    /// How long to wait for trailing transcripts after recording stops
    pub finalize_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_record: Duration::from_secs(60),
            finalize_grace: Duration::from_secs(10),
        }
    }
}

impl SessionConfig {
    /// Pull the timing parameters out of the application config.
    pub fn from_config(config: &voxbar_core::Config) -> Self {
        Self {
            max_record: config.max_record_duration(),
            finalize_grace: config.finalize_grace(),
        }
    }
}

enum Command {
    Stop,
    Cancel,
}

/// Why the recording loop ended.
enum LoopExit {
    /// User stop or duration ceiling; proceed to finalization.
    Stopped,
    Cancelled,
    Failed(SessionError),
}

/// Handle to a running session.
///
/// Commands are asynchronous requests; watch the event stream or await
/// [`SessionHandle::outcome`] to observe their effect. Dropping the
/// handle cancels the session.
pub struct SessionHandle {
    id: u64,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionState>,
    task: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    /// Identifier of this session, unique within the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop recording and deliver whatever transcribed.
    pub fn stop(&self) {
        self.commands.send(Command::Stop).ok();
    }

    /// Abandon the session without delivering anything.
    pub fn cancel(&self) {
        self.commands.send(Command::Cancel).ok();
    }

    /// Current state of the session.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Whether the session has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Wait for the session to end and return how it went.
    pub async fn outcome(self) -> anyhow::Result<SessionOutcome> {
        self.task.await.context("session task failed")
    }
}

/// Spawn a new session and hand back its handle.
///
/// The session starts working immediately; failures (no device, channel
/// refused) surface as a `Failed` outcome rather than an early return so
/// callers observe every session the same way.
pub fn start_session(
    config: SessionConfig,
    source: Arc<dyn AudioSource>,
    connector: Arc<dyn TranscriptConnector>,
    editor: Box<dyn EditorSink>,
    dispatch: Box<dyn MessageSink>,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> SessionHandle {
    let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(SessionState::Idle);

    let runner = SessionRunner {
        id,
        config,
        editor,
        dispatch,
        events,
        state: state_tx,
        channel: None,
        pending: Vec::new(),
        final_text: None,
        mic_active: false,
    };

    let task = tokio::spawn(run_session(runner, source, connector, command_rx));

    SessionHandle {
        id,
        commands: command_tx,
        state: state_rx,
        task,
    }
}

/// State the session task mutates as events arrive. Everything awaited on
/// lives outside this struct so handlers and select arms never fight over
/// borrows.
struct SessionRunner {
    id: u64,
    config: SessionConfig,
    editor: Box<dyn EditorSink>,
    dispatch: Box<dyn MessageSink>,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: watch::Sender<SessionState>,
    /// The transcript channel once the open has completed.
    channel: Option<Box<dyn TranscriptChannel>>,
    /// Chunks captured before the channel opened, in capture order.
    pending: Vec<AudioChunk>,
    /// Most recent final transcript; the last one wins.
    final_text: Option<String>,
    mic_active: bool,
}

impl SessionRunner {
    fn set_state(&mut self, state: SessionState) {
        debug!(session = self.id, state = ?state, "state changed");
        self.state.send_replace(state);
        self.emit(SessionEvent::StateChanged(state));
    }

    fn emit(&self, event: SessionEvent) {
        self.events.send(event).ok();
    }

    fn on_chunk(&mut self, chunk: AudioChunk) {
        if !self.mic_active && !chunk.is_silent() {
            self.mic_active = true;
            debug!(session = self.id, level_dbfs = chunk.level_dbfs, "microphone signal detected");
            self.emit(SessionEvent::MicActive);
        }
        match self.channel.as_mut() {
            Some(channel) => channel.send(chunk),
            None => self.pending.push(chunk),
        }
    }

    fn adopt_channel(&mut self, mut channel: Box<dyn TranscriptChannel>) {
        debug!(
            session = self.id,
            buffered_chunks = self.pending.len(),
            "transcript channel open, flushing buffered audio"
        );
        for chunk in self.pending.drain(..) {
            channel.send(chunk);
        }
        self.channel = Some(channel);
    }

    fn on_transcript(&mut self, event: TranscriptEvent) {
        match event {
            TranscriptEvent::Partial(text) => {
                self.emit(SessionEvent::Partial(text));
            }
            TranscriptEvent::Final(text) => {
                debug!(session = self.id, chars = text.len(), "final transcript updated");
                self.final_text = Some(text);
            }
        }
    }

    /// Write the transcript into the editor and send it as a message.
    fn deliver(&mut self, text: &str) {
        self.editor.clear_content();
        self.editor.set_content(text);
        self.dispatch.send_message(text);
    }

    /// Enter the terminal state and emit the closing event.
    fn finish(mut self, outcome: SessionOutcome) -> SessionOutcome {
        let state = match &outcome {
            SessionOutcome::Delivered(_) => SessionState::Delivered,
            SessionOutcome::Cancelled => SessionState::Cancelled,
            SessionOutcome::Failed(_) => SessionState::Failed,
        };
        self.set_state(state);

        match &outcome {
            SessionOutcome::Delivered(text) => {
                info!(session = self.id, chars = text.len(), "session delivered")
            }
            SessionOutcome::Cancelled => info!(session = self.id, "session cancelled"),
            SessionOutcome::Failed(e) => warn!(session = self.id, error = %e, "session failed"),
        }

        self.emit(SessionEvent::Closed(outcome.clone()));
        outcome
    }

    /// Wait out the transcript tail, then deliver or fail.
    async fn finalize(
        mut self,
        capture: CaptureStream,
        mut opened_rx: mpsc::Receiver<voxbar_realtime::Result<Box<dyn TranscriptChannel>>>,
        mut transcript_rx: mpsc::Receiver<TranscriptEvent>,
    ) -> SessionOutcome {
        self.set_state(SessionState::Finalizing);

        // Recording is over: release the device before waiting on the tail.
        drop(capture);

        if let Some(channel) = self.channel.as_mut() {
            channel.finish();
        }

        let grace = sleep(self.config.finalize_grace);
        tokio::pin!(grace);

        loop {
            select! {
                biased;

                opened = opened_rx.recv(), if self.channel.is_none() => match opened {
                    Some(Ok(channel)) => {
                        // Late open: flush everything we captured, then
                        // ask for the tail right away.
                        self.adopt_channel(channel);
                        if let Some(channel) = self.channel.as_mut() {
                            channel.finish();
                        }
                    }
                    Some(Err(e)) => {
                        warn!(session = self.id, error = %e, "transcript channel failed to open");
                        return self.finish(SessionOutcome::Failed(
                            SessionError::ChannelOpenFailed(e.to_string()),
                        ));
                    }
                    None => {
                        return self.finish(SessionOutcome::Failed(
                            SessionError::ChannelOpenFailed(
                                "connector dropped without a result".to_string(),
                            ),
                        ));
                    }
                },

                transcript = transcript_rx.recv(), if self.channel.is_some() => match transcript {
                    Some(event) => self.on_transcript(event),
                    None => {
                        debug!(session = self.id, "transcript channel drained");
                        break;
                    }
                },

                () = &mut grace => {
                    warn!(
                        session = self.id,
                        grace = ?self.config.finalize_grace,
                        "grace period expired before the channel drained"
                    );
                    break;
                }
            }
        }

        let channel_opened = self.channel.is_some();
        if let Some(channel) = self.channel.as_mut() {
            channel.close();
        }

        match self.final_text.take() {
            Some(text) => {
                self.deliver(&text);
                self.finish(SessionOutcome::Delivered(text))
            }
            None if channel_opened => self.finish(SessionOutcome::Failed(
                SessionError::ChannelClosedPrematurely,
            )),
            None => self.finish(SessionOutcome::Failed(SessionError::ChannelOpenFailed(
                "channel did not open before the grace period expired".to_string(),
            ))),
        }
    }
}

async fn run_session(
    mut s: SessionRunner,
    source: Arc<dyn AudioSource>,
    connector: Arc<dyn TranscriptConnector>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) -> SessionOutcome {
    info!(
        session = s.id,
        source = source.name(),
        connector = connector.name(),
        "session starting"
    );
    s.set_state(SessionState::RequestingDevice);

    let mut capture = match source.acquire().await {
        Ok(capture) => capture,
        Err(e) => {
            warn!(session = s.id, error = %e, "audio input unavailable");
            return s.finish(SessionOutcome::Failed(SessionError::DeviceUnavailable(
                e.to_string(),
            )));
        }
    };

    // Open the channel while audio is already flowing; chunks cut before
    // it is up collect in the pending buffer. If the session ends first,
    // dropping `opened_rx` makes the late channel close itself on drop.
    let (transcript_tx, mut transcript_rx) = mpsc::channel(TRANSCRIPT_QUEUE_DEPTH);
    let (opened_tx, mut opened_rx) = mpsc::channel(1);
    tokio::spawn({
        let connector = Arc::clone(&connector);
        async move {
            opened_tx.send(connector.open(transcript_tx).await).await.ok();
        }
    });

    s.set_state(SessionState::Recording);
    let started = Instant::now();
    let mut ticker = interval_at(started + TICK_PERIOD, TICK_PERIOD);
    let ceiling = sleep_until(started + s.config.max_record);
    tokio::pin!(ceiling);

    let exit = loop {
        select! {
            biased;

            command = commands.recv() => match command {
                Some(Command::Stop) => {
                    info!(session = s.id, elapsed = ?started.elapsed(), "stop requested");
                    break LoopExit::Stopped;
                }
                // A dropped handle means nobody is left to deliver to.
                Some(Command::Cancel) | None => break LoopExit::Cancelled,
            },

            () = &mut ceiling => {
                info!(session = s.id, limit = ?s.config.max_record, "maximum duration reached");
                break LoopExit::Stopped;
            }

            opened = opened_rx.recv(), if s.channel.is_none() => match opened {
                Some(Ok(channel)) => s.adopt_channel(channel),
                Some(Err(e)) => {
                    warn!(session = s.id, error = %e, "transcript channel failed to open");
                    break LoopExit::Failed(SessionError::ChannelOpenFailed(e.to_string()));
                }
                None => break LoopExit::Failed(SessionError::ChannelOpenFailed(
                    "connector dropped without a result".to_string(),
                )),
            },

            transcript = transcript_rx.recv(), if s.channel.is_some() => match transcript {
                Some(event) => s.on_transcript(event),
                None => {
                    warn!(session = s.id, "transcript channel closed while recording");
                    break LoopExit::Failed(SessionError::ChannelClosedPrematurely);
                }
            },

            chunk = capture.next_chunk() => match chunk {
                Some(chunk) => s.on_chunk(chunk),
                None => {
                    warn!(session = s.id, "input stream ended while recording");
                    break LoopExit::Failed(SessionError::DeviceUnavailable(
                        "input stream ended".to_string(),
                    ));
                }
            },

            _ = ticker.tick() => {
                s.emit(SessionEvent::Tick {
                    elapsed_secs: started.elapsed().as_secs(),
                });
            }
        }
    };

    match exit {
        LoopExit::Stopped => s.finalize(capture, opened_rx, transcript_rx).await,
        LoopExit::Cancelled => {
            drop(capture);
            if let Some(channel) = s.channel.as_mut() {
                channel.close();
            }
            s.finish(SessionOutcome::Cancelled)
        }
        LoopExit::Failed(error) => {
            drop(capture);
            if let Some(channel) = s.channel.as_mut() {
                channel.close();
            }
            s.finish(SessionOutcome::Failed(error))
        }
    }
}
