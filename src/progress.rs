//! Progress channel for live provisioning observers.
//!
//! A publish/subscribe broadcast keyed by correlation (session) id. Delivery
//! is best-effort and fire-and-forget: no acknowledgement, no persistence,
//! no replay. A subscriber that connects after a message was published
//! simply misses it, and publishing with no observer drops the message.

use std::collections::HashMap;
use std::sync::Arc;

use colored::Colorize;
use tokio::sync::{broadcast, Mutex};
use tracing::trace;

/// Broadcast buffer per correlation id. A slow subscriber past this many
/// lines starts losing the oldest ones.
const CHANNEL_CAPACITY: usize = 256;

/// Fan-out progress channel keyed by correlation id.
#[derive(Debug, Clone, Default)]
pub struct ProgressChannel {
    /// Per-correlation-id broadcast senders.
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
}

impl ProgressChannel {
    /// Creates an empty progress channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the progress stream for one correlation id.
    ///
    /// Only messages published after this call are delivered.
    pub async fn subscribe(&self, correlation_id: &str) -> broadcast::Receiver<String> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(correlation_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publishes a line to the observers of one correlation id.
    ///
    /// A `None` correlation id is a no-op: steps run identically whether or
    /// not anyone is watching.
    pub async fn publish(&self, correlation_id: Option<&str>, line: impl Into<String>) {
        let Some(correlation_id) = correlation_id else {
            return;
        };
        let line = line.into();

        let channels = self.channels.lock().await;
        match channels.get(correlation_id) {
            Some(tx) if tx.receiver_count() > 0 => {
                // Send only fails when all receivers are gone; the message
                // is simply dropped in that case.
                let _ = tx.send(line);
            }
            _ => trace!("No observer for session {correlation_id}, dropping progress line"),
        }
    }

    /// Publishes a success line with the ✔ marker.
    pub async fn publish_ok(&self, correlation_id: Option<&str>, message: &str) {
        self.publish(correlation_id, format!("{} {message}", "✔".green()))
            .await;
    }

    /// Publishes a failure line with the ✘ marker.
    pub async fn publish_err(&self, correlation_id: Option<&str>, message: &str) {
        self.publish(correlation_id, format!("{} {message}", "✘".red()))
            .await;
    }

    /// Returns the number of live observers for one correlation id.
    pub async fn subscriber_count(&self, correlation_id: &str) -> usize {
        let channels = self.channels.lock().await;
        channels
            .get(correlation_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let channel = ProgressChannel::new();
        let mut rx = channel.subscribe("session-1").await;

        channel.publish(Some("session-1"), "step one done").await;

        let line = rx.recv().await.expect("receive");
        assert_eq!(line, "step one done");
    }

    #[tokio::test]
    async fn test_publish_without_correlation_is_noop() {
        let channel = ProgressChannel::new();
        // Must not panic or create a channel.
        channel.publish(None, "ignored").await;
        assert_eq!(channel.subscriber_count("anything").await, 0);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_messages() {
        let channel = ProgressChannel::new();

        channel.publish(Some("session-1"), "before subscribe").await;

        let mut rx = channel.subscribe("session-1").await;
        channel.publish(Some("session-1"), "after subscribe").await;

        let line = rx.recv().await.expect("receive");
        assert_eq!(line, "after subscribe");
    }

    #[tokio::test]
    async fn test_fan_out_to_multiple_subscribers() {
        let channel = ProgressChannel::new();
        let mut rx1 = channel.subscribe("session-1").await;
        let mut rx2 = channel.subscribe("session-1").await;
        assert_eq!(channel.subscriber_count("session-1").await, 2);

        channel.publish(Some("session-1"), "hello").await;

        assert_eq!(rx1.recv().await.expect("rx1"), "hello");
        assert_eq!(rx2.recv().await.expect("rx2"), "hello");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let channel = ProgressChannel::new();
        let mut rx1 = channel.subscribe("session-1").await;
        let _rx2 = channel.subscribe("session-2").await;

        channel.publish(Some("session-1"), "for one").await;

        assert_eq!(rx1.recv().await.expect("rx1"), "for one");
        // session-2 got nothing; its receiver would block, so just check
        // nothing is immediately available.
        let mut rx2 = channel.subscribe("session-2").await;
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_markers_carry_message_text() {
        colored::control::set_override(false);

        let channel = ProgressChannel::new();
        let mut rx = channel.subscribe("session-1").await;

        channel
            .publish_ok(Some("session-1"), "Provisioning completed")
            .await;
        channel
            .publish_err(Some("session-1"), "Device 10.0.0.9 is not reachable")
            .await;

        let ok = rx.recv().await.expect("ok line");
        assert!(ok.contains("Provisioning completed"));
        assert!(ok.starts_with('✔'));

        let err = rx.recv().await.expect("err line");
        assert!(err.contains("not reachable"));
        assert!(err.starts_with('✘'));
    }
}
