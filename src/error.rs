//! Error types for the messenger server
//!
//! Defines connection-level errors and registration errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Connection-level errors
///
/// Raised inside a connection handler; each one terminates only the
/// connection it occurred on.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the socket (fatal for this connection)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame contained invalid UTF-8 (protocol violation)
    #[error("invalid UTF-8 in frame: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Username registration errors
///
/// Both variants are reported to the client as the `INUS` response code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    /// Another session already holds this username
    #[error("username '{0}' is already in use")]
    AlreadyInUse(String),

    /// The username collides with the reserved system name
    #[error("username '{0}' is reserved")]
    Reserved(String),
}
