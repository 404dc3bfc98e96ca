//! Realtime store abstraction: path subscriptions and writes

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// The value (or absence) observed at a store path
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: String,
    value: Option<Value>,
}

impl Snapshot {
    /// Build a snapshot; `null` and empty objects mean "no data"
    pub fn new(path: impl Into<String>, value: Option<Value>) -> Self {
        let value = value.filter(|v| match v {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        });
        Self {
            path: path.into(),
            value,
        }
    }

    pub fn absent(path: impl Into<String>) -> Self {
        Self::new(path, None)
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// A notification delivered to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Snapshot(Snapshot),
    /// Transport or connection failure; the subscription stays open
    Error(String),
}

/// Cloneable cancel handle for a subscription
///
/// `unsubscribe` may be called any number of times, including after the
/// underlying stream has already closed.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    path: String,
    cancel: CancellationToken,
}

impl SubscriptionHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn unsubscribe(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("Unsubscribing from {}", self.path);
        }
        self.cancel.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Resolves once the subscription is cancelled from either side
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

/// Receiving side of a live subscription
///
/// Dropping the subscription unsubscribes it.
#[derive(Debug)]
pub struct Subscription {
    handle: SubscriptionHandle,
    events: mpsc::UnboundedReceiver<StoreEvent>,
}

impl Subscription {
    pub fn path(&self) -> &str {
        self.handle.path()
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    /// Wait for the next event; `None` once unsubscribed or closed by the store
    pub async fn next(&mut self) -> Option<StoreEvent> {
        tokio::select! {
            biased;
            _ = self.handle.cancel.cancelled() => None,
            event = self.events.recv() => event,
        }
    }

    pub fn unsubscribe(&self) {
        self.handle.unsubscribe();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.cancel.cancel();
    }
}

/// Store-side end of a subscription
#[derive(Debug, Clone)]
pub struct SubscriptionSink {
    path: String,
    sender: mpsc::UnboundedSender<StoreEvent>,
    cancel: CancellationToken,
}

impl SubscriptionSink {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Deliver an event, returning false once the subscriber is gone
    pub fn send(&self, event: StoreEvent) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.sender.send(event).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.sender.is_closed()
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

/// Create a connected sink/subscription pair for `path`
pub fn channel(path: &str) -> (SubscriptionSink, Subscription) {
    let (sender, events) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let sink = SubscriptionSink {
        path: path.to_string(),
        sender,
        cancel: cancel.clone(),
    };
    let subscription = Subscription {
        handle: SubscriptionHandle {
            path: path.to_string(),
            cancel,
        },
        events,
    };
    (sink, subscription)
}

/// Key-path JSON store with change notification
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait RealtimeStore: Send + Sync {
    /// Start receiving snapshots of `path` on every change
    fn subscribe(&self, path: &str) -> Subscription;

    /// Overwrite the value at `path`, resolving once the store acknowledged it
    async fn set(&self, path: &str, value: Value) -> crate::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_empty_object_are_absent() {
        assert!(!Snapshot::new("/a", Some(Value::Null)).exists());
        assert!(!Snapshot::new("/a", Some(json!({}))).exists());
        assert!(!Snapshot::absent("/a").exists());
        assert!(Snapshot::new("/a", Some(json!(0))).exists());
        assert!(Snapshot::new("/a", Some(json!([]))).exists());
    }

    #[tokio::test]
    async fn events_flow_until_unsubscribed() {
        let (sink, mut subscription) = channel("/devices/23/current");
        assert!(sink.send(StoreEvent::Error("boom".to_string())));
        assert_eq!(
            subscription.next().await,
            Some(StoreEvent::Error("boom".to_string()))
        );

        subscription.unsubscribe();
        assert!(sink.is_cancelled());
        assert!(!sink.send(StoreEvent::Error("late".to_string())));
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let (sink, subscription) = channel("/a");
        let handle = subscription.handle();
        handle.unsubscribe();
        handle.unsubscribe();
        subscription.unsubscribe();
        assert!(!handle.is_active());
        assert!(sink.is_cancelled());
    }

    #[tokio::test]
    async fn dropping_subscription_cancels_sink() {
        let (sink, subscription) = channel("/a");
        let handle = subscription.handle();
        drop(subscription);
        assert!(sink.is_cancelled());
        assert!(!handle.is_active());
        handle.unsubscribe();
    }

    #[tokio::test]
    async fn closed_store_side_ends_stream() {
        let (sink, mut subscription) = channel("/a");
        drop(sink);
        assert_eq!(subscription.next().await, None);
        assert!(subscription.handle().is_active());
    }
}
