//! Delivery seams into the host chat surface.

/// The message editor the final transcript is written into.
pub trait EditorSink: Send {
    /// Discard whatever draft is currently in the editor.
    fn clear_content(&mut self);

    /// Replace the editor content with `text`.
    fn set_content(&mut self, text: &str);
}

/// The outbound message path of the host chat surface.
pub trait MessageSink: Send {
    /// Send `text` as a chat message.
    fn send_message(&mut self, text: &str);
}
