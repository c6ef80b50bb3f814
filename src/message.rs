//! Wire protocol definitions
//!
//! Plain-text protocol over TCP: fixed-capacity frames with null padding, no
//! length prefixes or delimiters. This module holds the frame sizes, the
//! response codes, the `Message` type, and the text formats the server
//! writes to clients.

use crate::error::AppError;

/// System name used as the author of connect notices; never a valid username
pub const RESERVED_USERNAME: &str = "SERVER";

/// Capacity of the handshake frame carrying the username
pub const USERNAME_FRAME_LEN: usize = 128;

/// Capacity of every chat frame after the handshake
pub const MESSAGE_FRAME_LEN: usize = 1024;

/// Command: close the connection
pub const CMD_EXIT: &str = "/exit";

/// Command: request the connected-user roster
pub const CMD_LIST: &str = "/list";

/// Response code acknowledging `/exit`
pub const CLOSE_OK: &[u8] = b"COK";

/// Response code rejecting a taken or reserved username
pub const NAME_IN_USE: &[u8] = b"INUS";

/// Reserved acknowledgement code
///
/// Clients recognize it as a no-op but the server never sends it; dead
/// protocol surface kept for wire compatibility.
pub const ACK: &[u8] = b"OK";

/// A chat message awaiting broadcast
///
/// Immutable once created; dropped after the broadcast attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Username of the sender, or `"SERVER"` for system notices
    pub author: String,
    /// Message text as decoded from the frame
    pub content: String,
}

impl Message {
    /// Create a message from an author and content
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
        }
    }

    /// Create the system notice broadcast when a user registers
    pub fn connect_notice(username: &str) -> Self {
        Self::new(RESERVED_USERNAME, format!("{} connected", username))
    }

    /// Format the line written to each broadcast target
    pub fn format_line(&self) -> String {
        format!("{}: {}", self.author, self.content)
    }
}

/// Decode one received frame
///
/// Interprets the read bytes as UTF-8 and strips the null padding a
/// fixed-capacity sender leaves around the payload. Invalid UTF-8 is a
/// protocol violation.
pub fn decode_frame(buf: &[u8]) -> Result<String, AppError> {
    let text = std::str::from_utf8(buf)?;
    Ok(text.trim_matches('\0').to_string())
}

/// Format the `/list` roster reply
///
/// The count covers every registered user, the requester included.
pub fn format_roster(usernames: &[String]) -> String {
    let mut roster = format!("Connected users ({}):\n", usernames.len());
    for username in usernames {
        roster.push_str(&format!("  {}\n", username));
    }
    roster
}
