//! Broadcast loop
//!
//! The server's only periodic task. Every cycle it drains the inbox queue
//! and fans each message out to every registered session except the author.
//! A failed write to one recipient is logged and skipped; it never affects
//! the other recipients or the remaining messages.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::inbox::InboxQueue;
use crate::message::Message;
use crate::registry::SessionRegistry;

/// Interval between broadcast cycles
pub const BROADCAST_INTERVAL: Duration = Duration::from_millis(100);

/// Run the broadcast loop forever
///
/// Spawned once at server startup; never returns under normal operation.
pub async fn run_broadcast_loop(registry: Arc<SessionRegistry>, inbox: Arc<InboxQueue>) {
    let mut interval = tokio::time::interval(BROADCAST_INTERVAL);
    loop {
        interval.tick().await;
        broadcast_cycle(&registry, &inbox).await;
    }
}

/// Run a single broadcast cycle: drain the inbox and deliver every message
pub async fn broadcast_cycle(registry: &SessionRegistry, inbox: &InboxQueue) {
    for message in inbox.drain().await {
        deliver(registry, &message).await;
    }
}

/// Fan one message out to all sessions except its author
async fn deliver(registry: &SessionRegistry, message: &Message) {
    let targets = registry.broadcast_targets(&message.author).await;
    let line = message.format_line();

    for target in targets {
        if let Err(e) = target.send(line.as_bytes()).await {
            warn!(
                "Failed to deliver message to '{}': {}",
                target.username, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SessionWriter;

    use tokio::io::{AsyncReadExt, DuplexStream};
    use tokio::sync::Mutex;
    use tokio::time::timeout;

    const READ_TIMEOUT: Duration = Duration::from_secs(1);

    async fn register_with_duplex(registry: &SessionRegistry, username: &str) -> DuplexStream {
        let (server_end, client_end) = tokio::io::duplex(1024);
        let writer: SessionWriter = Arc::new(Mutex::new(Box::new(server_end)));
        registry.register(username, writer).await.unwrap();
        client_end
    }

    async fn read_some(stream: &mut DuplexStream) -> String {
        let mut buf = [0u8; 1024];
        let n = timeout(READ_TIMEOUT, stream.read(&mut buf))
            .await
            .expect("timed out waiting for broadcast")
            .expect("read failed");
        String::from_utf8(buf[..n].to_vec()).expect("broadcast was not UTF-8")
    }

    #[tokio::test]
    async fn test_message_delivered_to_other_sessions_in_one_cycle() {
        let registry = SessionRegistry::new();
        let inbox = InboxQueue::new();
        let mut alice = register_with_duplex(&registry, "alice").await;

        inbox.enqueue(Message::new("bob", "hi")).await;
        broadcast_cycle(&registry, &inbox).await;

        assert_eq!(read_some(&mut alice).await, "bob: hi");
    }

    #[tokio::test]
    async fn test_author_does_not_receive_own_message() {
        let registry = SessionRegistry::new();
        let inbox = InboxQueue::new();
        let _alice = register_with_duplex(&registry, "alice").await;
        let mut bob = register_with_duplex(&registry, "bob").await;

        inbox.enqueue(Message::new("bob", "hi")).await;
        broadcast_cycle(&registry, &inbox).await;

        // A follow-up system notice reaches everyone, so bob's very first
        // read showing the notice proves his own message was skipped.
        inbox.enqueue(Message::new("SERVER", "marker")).await;
        broadcast_cycle(&registry, &inbox).await;

        assert_eq!(read_some(&mut bob).await, "SERVER: marker");
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_block_others() {
        let registry = SessionRegistry::new();
        let inbox = InboxQueue::new();

        // alice's peer is gone, so every write to her handle fails
        let alice_peer = register_with_duplex(&registry, "alice").await;
        drop(alice_peer);
        let mut bob = register_with_duplex(&registry, "bob").await;

        inbox.enqueue(Message::new("carol", "hello")).await;
        broadcast_cycle(&registry, &inbox).await;

        assert_eq!(read_some(&mut bob).await, "carol: hello");
    }

    #[tokio::test]
    async fn test_single_author_order_preserved() {
        let registry = SessionRegistry::new();
        let inbox = InboxQueue::new();
        let mut alice = register_with_duplex(&registry, "alice").await;

        inbox.enqueue(Message::new("bob", "one")).await;
        inbox.enqueue(Message::new("bob", "two")).await;
        broadcast_cycle(&registry, &inbox).await;

        let mut received = String::new();
        while !received.contains("bob: two") {
            received.push_str(&read_some(&mut alice).await);
        }
        let first = received.find("bob: one").expect("first message missing");
        let second = received.find("bob: two").expect("second message missing");
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_cycle_with_empty_inbox_is_quiet() {
        let registry = SessionRegistry::new();
        let inbox = InboxQueue::new();
        let _alice = register_with_duplex(&registry, "alice").await;

        // Nothing enqueued; the cycle must not write anything
        broadcast_cycle(&registry, &inbox).await;
        assert!(inbox.drain().await.is_empty());
    }
}
