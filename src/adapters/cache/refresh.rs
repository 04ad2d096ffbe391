//! Refresh-ahead handler that forwards due keys to a channel.
//!
//! The receiving side belongs to whoever owns the compute function: it drains
//! keys, recomputes and writes fresh values back with `MultiTierCache::set`.

use std::time::Duration;
use tokio::sync::mpsc;

use crate::ports::RefreshAheadHandler;

/// A key whose cached value should be recomputed soon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub key: String,
    pub remaining_ttl: Duration,
}

/// Sends refresh requests into a bounded channel.
///
/// Never blocks the reader: when the channel is full or closed the request
/// is dropped and the entry expires normally.
#[derive(Debug, Clone)]
pub struct ChannelRefreshHandler {
    sender: mpsc::Sender<RefreshRequest>,
}

impl ChannelRefreshHandler {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<RefreshRequest>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl RefreshAheadHandler for ChannelRefreshHandler {
    fn on_refresh_due(&self, key: &str, remaining_ttl: Duration) {
        let request = RefreshRequest {
            key: key.to_string(),
            remaining_ttl,
        };
        if let Err(e) = self.sender.try_send(request) {
            tracing::debug!(key = %key, "Dropped refresh-ahead request: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_due_keys() {
        let (handler, mut rx) = ChannelRefreshHandler::new(4);
        handler.on_refresh_due("rag:q1", Duration::from_secs(3));

        let request = rx.recv().await.unwrap();
        assert_eq!(request.key, "rag:q1");
        assert_eq!(request.remaining_ttl, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let (handler, mut rx) = ChannelRefreshHandler::new(1);
        handler.on_refresh_due("a", Duration::ZERO);
        handler.on_refresh_due("b", Duration::ZERO);

        assert_eq!(rx.recv().await.unwrap().key, "a");
        assert!(rx.try_recv().is_err());
    }
}
