//! WebSocket-backed transcript channel.
//!
//! Once open, the connection is driven by two spawned tasks: a writer
//! draining an outbound queue into the socket, and a reader turning
//! inbound frames into transcript events. The handle itself only ever
//! enqueues, so callers never block on the network.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};
use voxbar_core::{AudioChunk, Bytes, TranscriptEvent};

use crate::config::ChannelConfig;
use crate::{ChannelError, Result, TranscriptChannel, TranscriptConnector, wire};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector for the AssemblyAI v2 realtime endpoint.
#[derive(Debug, Clone)]
pub struct RealtimeConnector {
    config: ChannelConfig,
}

impl RealtimeConnector {
    /// Create a new connector with the given configuration.
    pub fn new(config: ChannelConfig) -> Self {
        Self { config }
    }

    /// Create a connector from just an API key with default settings.
    pub fn from_api_key(api_key: impl Into<String>) -> Self {
        Self::new(ChannelConfig::new(api_key))
    }
}

#[async_trait]
impl TranscriptConnector for RealtimeConnector {
    async fn open(
        &self,
        events: mpsc::Sender<TranscriptEvent>,
    ) -> Result<Box<dyn TranscriptChannel>> {
        let url = self.config.url();
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ChannelError::OpenFailed(e.to_string()))?;
        let token = HeaderValue::from_str(&self.config.api_key).map_err(|_| {
            ChannelError::OpenFailed("API key is not a valid header value".to_string())
        })?;
        request.headers_mut().insert(AUTHORIZATION, token);

        debug!(endpoint = %self.config.endpoint, "opening transcript channel");
        let (ws, response) = timeout(self.config.open_timeout, connect_async(request))
            .await
            .map_err(|_| ChannelError::HandshakeTimeout(self.config.open_timeout))?
            .map_err(|e| ChannelError::OpenFailed(e.to_string()))?;
        debug!(status = ?response.status(), "transcript channel open");

        let (sink, stream) = ws.split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(outbound_rx, sink));
        tokio::spawn(run_reader(stream, events));

        Ok(Box::new(RealtimeChannel {
            outbound: outbound_tx,
            finished: false,
            closed: false,
        }))
    }

    fn name(&self) -> &str {
        "assemblyai"
    }
}

enum Outbound {
    Audio(Bytes),
    Terminate,
    Close,
}

/// Handle to an open realtime channel.
pub struct RealtimeChannel {
    outbound: mpsc::UnboundedSender<Outbound>,
    finished: bool,
    closed: bool,
}

impl TranscriptChannel for RealtimeChannel {
    fn send(&mut self, chunk: AudioChunk) {
        if self.closed {
            return;
        }
        // Fire and forget; a dead writer means the reader has already
        // surfaced the closure through the event stream.
        self.outbound.send(Outbound::Audio(chunk.data)).ok();
    }

    fn finish(&mut self) {
        if self.finished || self.closed {
            return;
        }
        self.finished = true;
        self.outbound.send(Outbound::Terminate).ok();
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.outbound.send(Outbound::Close).ok();
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_writer(
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    mut sink: SplitSink<WsStream, Message>,
) {
    while let Some(frame) = outbound.recv().await {
        match frame {
            Outbound::Audio(data) => {
                if let Err(e) = sink.send(Message::Binary(data)).await {
                    warn!(error = %e, "failed to send audio frame");
                    break;
                }
            }
            Outbound::Terminate => {
                trace!("sending terminate frame");
                if let Err(e) = sink.send(Message::Text(wire::terminate_frame().into())).await {
                    warn!(error = %e, "failed to send terminate frame");
                }
            }
            Outbound::Close => break,
        }
    }
    sink.close().await.ok();
    trace!("writer task exiting");
}

async fn run_reader(mut stream: SplitStream<WsStream>, events: mpsc::Sender<TranscriptEvent>) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Some(event) = wire::parse_transcript(text.as_str()) {
                    trace!(
                        is_final = event.is_final(),
                        chars = event.text().len(),
                        "transcript event"
                    );
                    if events.send(event).await.is_err() {
                        // Consumer is gone, nothing left to deliver to.
                        break;
                    }
                }
            }
            Ok(Message::Close(frame)) => {
                debug!(?frame, "endpoint closed the channel");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "transcript channel failed");
                break;
            }
        }
    }
    trace!("reader task exiting");
    // Dropping the events sender here is what marks the channel as ended
    // for the consumer.
}
