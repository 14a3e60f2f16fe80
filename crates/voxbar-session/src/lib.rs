//! Recording session management for voxbar.
//!
//! A session owns the whole arc of one voice recording: acquire the
//! microphone, stream audio to the transcript channel while partials come
//! back, stop at the user's request or at the duration ceiling, wait out
//! the transcript tail, then deliver the final text into the chat surface
//! exactly once. Sessions that are cancelled or fail deliver nothing.
//!
//! All mutable session state lives inside a single task; handles talk to
//! it exclusively through channels, so commands can never race the state
//! they act on.

mod error;
mod event;
mod session;
mod sink;
mod slot;
mod state;

pub use error::SessionError;
pub use event::{SessionEvent, SessionOutcome};
pub use session::{SessionConfig, SessionHandle, start_session};
pub use sink::{EditorSink, MessageSink};
pub use slot::SessionSlot;
pub use state::SessionState;
