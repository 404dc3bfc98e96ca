//! In-process realtime store, used for demo mode and tests

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::store::{self, RealtimeStore, Snapshot, StoreEvent, Subscription, SubscriptionSink};
use crate::tree;

/// Recent writes kept for inspection
const WRITE_LOG_CAPACITY: usize = 64;

#[derive(Debug)]
struct Subscriber {
    segments: Vec<String>,
    sink: SubscriptionSink,
}

#[derive(Debug, Default)]
struct Inner {
    root: Value,
    subscribers: Vec<Subscriber>,
    opened: usize,
    writes: VecDeque<(String, Value)>,
}

impl Inner {
    fn prune_cancelled(&mut self) {
        self.subscribers.retain(|s| !s.sink.is_cancelled());
    }
}

/// A JSON tree held in memory that notifies subscribers on every write
///
/// New subscribers immediately receive the current value of their path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: Value) -> Self {
        let store = Self::default();
        store.lock().root = root;
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write `value` at `path` and notify related subscribers
    pub fn write(&self, path: &str, value: Value) {
        let mut inner = self.lock();
        let written = tree::segments(path);
        tree::set(&mut inner.root, &written, value.clone());
        if inner.writes.len() == WRITE_LOG_CAPACITY {
            inner.writes.pop_front();
        }
        inner.writes.push_back((path.to_string(), value));

        inner.prune_cancelled();
        let Inner {
            root, subscribers, ..
        } = &*inner;
        for subscriber in subscribers {
            let segments: Vec<&str> = subscriber.segments.iter().map(String::as_str).collect();
            if tree::related(&segments, &written) {
                let current = tree::node(root, &segments).cloned();
                subscriber
                    .sink
                    .send(StoreEvent::Snapshot(Snapshot::new(subscriber.sink.path(), current)));
            }
        }
    }

    /// Deliver a transport error to every live subscriber of exactly `path`
    pub fn inject_error(&self, path: &str, message: &str) {
        let inner = self.lock();
        let target = tree::segments(path);
        for subscriber in inner.subscribers.iter().filter(|s| s.segments == target) {
            subscriber.sink.send(StoreEvent::Error(message.to_string()));
        }
    }

    /// Current value at `path`
    pub fn value_at(&self, path: &str) -> Option<Value> {
        tree::node(&self.lock().root, &tree::segments(path)).cloned()
    }

    /// Subscriptions still held open by their subscribers
    pub fn active_subscriptions(&self) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|s| !s.sink.is_cancelled())
            .count()
    }

    pub fn active_subscriptions_at(&self, path: &str) -> usize {
        let target = tree::segments(path);
        self.lock()
            .subscribers
            .iter()
            .filter(|s| s.segments == target && !s.sink.is_cancelled())
            .count()
    }

    /// Subscriptions ever opened against this store
    pub fn total_subscriptions(&self) -> usize {
        self.lock().opened
    }

    /// The most recent writes, oldest first
    pub fn writes(&self) -> Vec<(String, Value)> {
        self.lock().writes.iter().cloned().collect()
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    fn subscribe(&self, path: &str) -> Subscription {
        let (sink, subscription) = store::channel(path);
        let segments: Vec<String> = tree::segments(path).into_iter().map(String::from).collect();

        let mut inner = self.lock();
        inner.prune_cancelled();
        let borrowed: Vec<&str> = segments.iter().map(String::as_str).collect();
        let current = tree::node(&inner.root, &borrowed).cloned();
        sink.send(StoreEvent::Snapshot(Snapshot::new(path, current)));

        inner.opened += 1;
        inner.subscribers.push(Subscriber { segments, sink });
        tracing::debug!("Memory store subscription opened for {}", path);
        subscription
    }

    async fn set(&self, path: &str, value: Value) -> crate::Result<()> {
        self.write(path, value);
        Ok(())
    }
}
