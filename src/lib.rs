//! Multi-Client TCP Messenger Server Library
//!
//! A minimal text chat server over raw TCP: clients register a username,
//! send plain-text frames, and every message is fanned out to all other
//! connected users.
//!
//! # Features
//! - Fixed-frame plain-text protocol (no length prefixes or delimiters)
//! - Username registration with uniqueness and a reserved system name
//! - `/list` roster and `/exit` commands
//! - Periodic broadcast loop with per-recipient failure isolation
//! - Connect notices authored by `"SERVER"`
//!
//! # Architecture
//! Shared state behind synchronized interfaces:
//! - `SessionRegistry` maps usernames to outbound socket handles
//! - `InboxQueue` buffers messages between handlers and the broadcast loop
//! - One handler task per connection; one periodic broadcast task
//! - Broadcast snapshots the registry, then writes with no lock held
//!
//! # Example
//! ```ignore
//! use console_messenger::MessengerServer;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let server = MessengerServer::bind("0.0.0.0:2431").await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod error;
pub mod handler;
pub mod inbox;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use broadcast::{broadcast_cycle, run_broadcast_loop, BROADCAST_INTERVAL};
pub use error::{AppError, RegisterError};
pub use handler::handle_connection;
pub use inbox::InboxQueue;
pub use message::Message;
pub use registry::{Session, SessionRegistry, SessionWriter};
pub use server::MessengerServer;
pub use types::ConnectionId;
