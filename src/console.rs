//! Console stand-ins for the chat surface.
//!
//! The real product wires sessions into a chat input bar; the binary in
//! this repo talks to a terminal instead. The editor draws the input line
//! in place and the dispatch appends sent messages the way a chat log
//! would.

use std::io::{self, Write};

use voxbar_session::{EditorSink, MessageSink};

/// Clears to end of line so redrawn content never leaves residue.
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Draws the input bar on the current terminal line.
pub struct ConsoleEditor;

impl EditorSink for ConsoleEditor {
    fn clear_content(&mut self) {
        print!("{CLEAR_LINE}");
        io::stdout().flush().ok();
    }

    fn set_content(&mut self, text: &str) {
        print!("{CLEAR_LINE}> {text}");
        io::stdout().flush().ok();
    }
}

/// Appends sent messages to the terminal like a chat log.
pub struct ConsoleDispatch;

impl MessageSink for ConsoleDispatch {
    fn send_message(&mut self, text: &str) {
        println!("{CLEAR_LINE}you: {text}");
    }
}
