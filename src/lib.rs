// Re-export from sub-crates
pub use voxbar_capture::{AudioSource, CaptureConfig, Microphone};
pub use voxbar_core::{
    APP_NAME, APP_NAME_PRETTY, Config, ConfigManager, DEFAULT_LOG_LEVEL, format_ticker_with_limit,
};
pub use voxbar_realtime::{ChannelConfig, RealtimeConnector, TranscriptConnector};
pub use voxbar_session::{
    SessionConfig, SessionError, SessionEvent, SessionOutcome, SessionSlot, SessionState,
};

// App-specific modules
pub mod console;

// Version from this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
