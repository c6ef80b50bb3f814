//! Inbox queue for pending broadcasts
//!
//! A shared list of messages waiting for the broadcast loop. Handlers append
//! concurrently; the broadcast loop takes everything in one atomic drain, so
//! each message is dequeued exactly once.

use tokio::sync::Mutex;

use crate::message::Message;

/// Queue of messages awaiting broadcast
///
/// Insertion order is delivery order, which preserves a single author's
/// submission order across cycles.
#[derive(Debug, Default)]
pub struct InboxQueue {
    pending: Mutex<Vec<Message>>,
}

impl InboxQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the end of the queue
    pub async fn enqueue(&self, message: Message) {
        self.pending.lock().await.push(message);
    }

    /// Atomically remove and return all queued messages
    ///
    /// Returns an empty vector if nothing is pending. The lock is released
    /// before the caller touches any socket.
    pub async fn drain(&self) -> Vec<Message> {
        std::mem::take(&mut *self.pending.lock().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_returns_messages_in_insertion_order() {
        let inbox = InboxQueue::new();
        inbox.enqueue(Message::new("alice", "one")).await;
        inbox.enqueue(Message::new("bob", "two")).await;
        inbox.enqueue(Message::new("alice", "three")).await;

        let drained = inbox.drain().await;
        assert_eq!(
            drained,
            vec![
                Message::new("alice", "one"),
                Message::new("bob", "two"),
                Message::new("alice", "three"),
            ]
        );
    }

    #[tokio::test]
    async fn test_drain_empties_the_queue() {
        let inbox = InboxQueue::new();
        inbox.enqueue(Message::new("alice", "hi")).await;

        assert_eq!(inbox.drain().await.len(), 1);
        assert!(inbox.drain().await.is_empty());
    }

    #[tokio::test]
    async fn test_drain_on_empty_queue() {
        let inbox = InboxQueue::new();
        assert!(inbox.drain().await.is_empty());
    }
}
