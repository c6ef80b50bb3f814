//! Session registry
//!
//! Maps active usernames to their outbound connection handles and enforces
//! username uniqueness plus the reserved system name. Mutation takes the
//! writer lock; broadcast reads take a point-in-time snapshot of cloned
//! handles so no lock is held during network writes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::RegisterError;
use crate::message::RESERVED_USERNAME;

/// Shared outbound handle for one connection
///
/// The write half of the socket, individually locked so the broadcast loop
/// and the owning handler can both write to it. Boxed as a trait object so
/// tests can substitute in-memory streams.
pub type SessionWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

/// A registered, currently connected user
///
/// Owned by the registry; handlers and the broadcast loop hold transient
/// clones (the writer is shared, not duplicated).
#[derive(Clone)]
pub struct Session {
    /// Unique username chosen at handshake
    pub username: String,
    writer: SessionWriter,
}

impl Session {
    /// Create a session from a username and its outbound handle
    pub fn new(username: impl Into<String>, writer: SessionWriter) -> Self {
        Self {
            username: username.into(),
            writer,
        }
    }

    /// Write raw bytes to this session's connection
    ///
    /// Returns an error if the peer is gone (client disconnected).
    pub async fn send(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await
    }
}

/// Registry of all active sessions, keyed by username
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session for `username`
    ///
    /// Fails if the username is already present or equals the reserved
    /// system name. Returns the stored session handle on success.
    pub async fn register(
        &self,
        username: &str,
        writer: SessionWriter,
    ) -> Result<Session, RegisterError> {
        if username == RESERVED_USERNAME {
            return Err(RegisterError::Reserved(username.to_string()));
        }

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(username) {
            return Err(RegisterError::AlreadyInUse(username.to_string()));
        }

        let session = Session::new(username, writer);
        sessions.insert(username.to_string(), session.clone());
        debug!("Session '{}' registered ({} total)", username, sessions.len());
        Ok(session)
    }

    /// Remove the session for `username` (no-op if absent)
    pub async fn unregister(&self, username: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(username).is_some() {
            debug!(
                "Session '{}' unregistered ({} total)",
                username,
                sessions.len()
            );
        }
    }

    /// Snapshot every session except the excluded author
    ///
    /// The cloned handles let the broadcast loop write without holding the
    /// registry lock behind a slow peer.
    pub async fn broadcast_targets(&self, excluding: &str) -> Vec<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|session| session.username != excluding)
            .cloned()
            .collect()
    }

    /// All registered usernames, sorted for a stable roster
    pub async fn list(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let mut usernames: Vec<String> = sessions.keys().cloned().collect();
        usernames.sort();
        usernames
    }

    /// Number of active sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are registered
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
