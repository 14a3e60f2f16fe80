use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voxbar::console::{ConsoleDispatch, ConsoleEditor};
use voxbar::{
    APP_NAME_PRETTY, CaptureConfig, ChannelConfig, ConfigManager, DEFAULT_LOG_LEVEL, Microphone,
    RealtimeConnector, SessionConfig, SessionEvent, SessionOutcome, SessionSlot, SessionState,
    VERSION, format_ticker_with_limit,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("VOXBAR_LOG")
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .init();

    // Load config
    let config_manager = ConfigManager::new()?;
    let config = config_manager.load()?;
    // save back the config to create the file if it doesn't exist
    config_manager.save(&config)?;

    let Some(api_key) = config.key_assemblyai() else {
        bail!(
            "no AssemblyAI API key set; add `assemblyai_key` to {}",
            config_manager.config_path().display()
        );
    };

    // Wire the microphone to the realtime transcript endpoint
    let source = Arc::new(Microphone::new(CaptureConfig::new(config.sample_rate())));
    let mut channel_config = ChannelConfig::new(api_key).with_sample_rate(config.sample_rate());
    if let Some(endpoint) = config.endpoint() {
        channel_config = channel_config.with_endpoint(endpoint);
    }
    let connector = Arc::new(RealtimeConnector::new(channel_config));

    let session_config = SessionConfig::from_config(&config);
    let max_record_secs = session_config.max_record.as_secs();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut slot = SessionSlot::new(session_config, source, connector, event_tx);

    println!(
        "{APP_NAME_PRETTY} {VERSION} - Enter starts/stops a recording, `c` cancels, `q` quits"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = InputLine::new(max_record_secs);

    loop {
        select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match line.trim() {
                    "" => toggle(&mut slot),
                    "c" | "cancel" => match slot.active() {
                        Some(session) => session.cancel(),
                        None => println!("nothing to cancel"),
                    },
                    "q" | "quit" => break,
                    other => println!("unknown command {other:?} (Enter, `c`, `q`)"),
                }
            }
            event = event_rx.recv() => {
                // The slot holds a sender, so the stream never ends.
                if let Some(event) = event {
                    ticker.render(event);
                }
            }
        }
    }

    // Let a live session wind down rather than dropping it mid-delivery
    if let Some(session) = slot.take() {
        session.stop();
        session.outcome().await?;
    }

    Ok(())
}

fn toggle(slot: &mut SessionSlot) {
    match slot.active() {
        Some(session) => session.stop(),
        None => {
            if let Err(e) = slot.start(Box::new(ConsoleEditor), Box::new(ConsoleDispatch)) {
                warn!(error = %e, "could not start a session");
            }
        }
    }
}

/// Live recording line: elapsed ticker plus the latest partial transcript.
struct InputLine {
    limit_secs: u64,
    elapsed_secs: u64,
    partial: String,
}

impl InputLine {
    fn new(limit_secs: u64) -> Self {
        Self {
            limit_secs,
            elapsed_secs: 0,
            partial: String::new(),
        }
    }

    fn render(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StateChanged(SessionState::Recording) => {
                self.elapsed_secs = 0;
                self.partial.clear();
                self.draw();
            }
            SessionEvent::StateChanged(SessionState::Finalizing) => {
                self.print_line("finalizing...");
            }
            SessionEvent::StateChanged(_) => {}
            SessionEvent::MicActive => info!("microphone signal detected"),
            SessionEvent::Partial(text) => {
                self.partial = text;
                self.draw();
            }
            SessionEvent::Tick { elapsed_secs } => {
                self.elapsed_secs = elapsed_secs;
                self.draw();
            }
            SessionEvent::Closed(outcome) => match outcome {
                // The message sink already printed the delivered text
                SessionOutcome::Delivered(_) => {}
                SessionOutcome::Cancelled => self.print_line("(cancelled)"),
                SessionOutcome::Failed(e) => self.print_line(&format!("(failed: {e})")),
            },
        }
    }

    fn draw(&self) {
        use std::io::Write as _;
        print!(
            "\r\x1b[2K[{}] {}",
            format_ticker_with_limit(self.elapsed_secs, self.limit_secs),
            self.partial
        );
        std::io::stdout().flush().ok();
    }

    fn print_line(&self, text: &str) {
        println!("\r\x1b[2K{text}");
    }
}
