//! Server bootstrap
//!
//! Owns the listening socket and the shared state, starts the broadcast
//! loop, and dispatches each accepted connection to its own handler task.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::broadcast::run_broadcast_loop;
use crate::handler::handle_connection;
use crate::inbox::InboxQueue;
use crate::registry::SessionRegistry;

/// The messenger server
///
/// Holds the listener plus the registry and inbox shared by every handler
/// and the broadcast loop.
pub struct MessengerServer {
    listener: TcpListener,
    registry: Arc<SessionRegistry>,
    inbox: Arc<InboxQueue>,
}

impl MessengerServer {
    /// Bind the listening socket
    ///
    /// Bind failure is fatal for the caller; there is no automatic rebind.
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            registry: Arc::new(SessionRegistry::new()),
            inbox: Arc::new(InboxQueue::new()),
        })
    }

    /// Address the listener is bound to (useful when binding port 0)
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the server: start the broadcast loop, then accept forever
    ///
    /// Each accepted connection gets its own handler task; a handler error
    /// is logged and ends only that connection. No connection limit is
    /// enforced.
    pub async fn run(self) {
        let Self {
            listener,
            registry,
            inbox,
        } = self;

        tokio::spawn(run_broadcast_loop(
            Arc::clone(&registry),
            Arc::clone(&inbox),
        ));
        info!("Broadcast loop started");

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let registry = Arc::clone(&registry);
                    let inbox = Arc::clone(&inbox);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, registry, inbox).await {
                            error!("Connection handler error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
