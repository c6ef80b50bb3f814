//! Connection handler
//!
//! Drives one accepted connection through its lifecycle: username handshake,
//! then the active read loop dispatching commands and chat messages. Each
//! handler runs in its own task; an error here ends only this connection.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::inbox::InboxQueue;
use crate::message::{
    decode_frame, format_roster, Message, CLOSE_OK, CMD_EXIT, CMD_LIST, MESSAGE_FRAME_LEN,
    NAME_IN_USE, USERNAME_FRAME_LEN,
};
use crate::registry::{SessionRegistry, SessionWriter};
use crate::types::ConnectionId;

/// Handle a new TCP connection
///
/// Performs the username handshake, registers the session, and runs the
/// read loop until the client exits or the connection fails. The session is
/// always unregistered before returning.
pub async fn handle_connection(
    stream: TcpStream,
    registry: Arc<SessionRegistry>,
    inbox: Arc<InboxQueue>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let conn_id = ConnectionId::new();
    debug!("Connection {} opened from {}", conn_id, peer_addr);

    let (mut reader, write_half) = stream.into_split();
    let writer: SessionWriter = Arc::new(Mutex::new(Box::new(write_half)));

    // Handshake: the first frame carries the candidate username.
    let mut buf = [0u8; USERNAME_FRAME_LEN];
    let n = reader.read(&mut buf).await?;
    if n == 0 {
        debug!("Connection {} closed before handshake", conn_id);
        return Ok(());
    }
    let username = decode_frame(&buf[..n])?;

    let session = match registry.register(&username, Arc::clone(&writer)).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Rejecting connection {}: {}", conn_id, e);
            send_response(&writer, NAME_IN_USE).await?;
            return Ok(());
        }
    };

    info!("New user {} connected", username);
    inbox.enqueue(Message::connect_notice(&username)).await;

    let result = session_loop(&mut reader, &writer, &session.username, &registry, &inbox).await;
    registry.unregister(&username).await;
    result
}

/// The active read loop for a registered session
///
/// Returns when the client exits, disconnects, or the connection fails; the
/// caller unregisters the session in every case.
async fn session_loop(
    reader: &mut OwnedReadHalf,
    writer: &SessionWriter,
    username: &str,
    registry: &SessionRegistry,
    inbox: &InboxQueue,
) -> Result<(), AppError> {
    let mut buf = [0u8; MESSAGE_FRAME_LEN];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            debug!("User {} disconnected without /exit", username);
            return Ok(());
        }

        let text = decode_frame(&buf[..n])?;
        match text.as_str() {
            CMD_EXIT => {
                send_response(writer, CLOSE_OK).await?;
                info!("User {} left the chat", username);
                return Ok(());
            }
            CMD_LIST => {
                let roster = format_roster(&registry.list().await);
                send_response(writer, roster.as_bytes()).await?;
            }
            _ => {
                info!("{}: {}", username, text);
                inbox.enqueue(Message::new(username, text)).await;
            }
        }
    }
}

/// Write a protocol response directly to this connection
async fn send_response(writer: &SessionWriter, bytes: &[u8]) -> Result<(), AppError> {
    let mut writer = writer.lock().await;
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}
