//! Firebase Realtime Database adapter over the REST streaming API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::io::HttpClient;
use crate::sse::{EventStreamParser, ServerEvent};
use crate::store::{self, RealtimeStore, Snapshot, StoreEvent, Subscription, SubscriptionSink};
use crate::tree;
use crate::MonitorError;

/// Payload of `put` and `patch` events
#[derive(Debug, Deserialize)]
struct ChangePayload {
    path: String,
    data: Value,
}

/// Realtime store backed by a Firebase database URL
pub struct FirebaseStore {
    base_url: String,
    auth_token: Option<String>,
    reconnect_delay: Duration,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for FirebaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseStore")
            .field("base_url", &self.base_url)
            .field("reconnect_delay", &self.reconnect_delay)
            .finish()
    }
}

impl FirebaseStore {
    pub fn new(config: &StoreConfig, http: Arc<dyn HttpClient>) -> Self {
        let base_url = config.url.trim_end_matches('/').to_string();
        tracing::debug!("Created FirebaseStore at {}", base_url);

        Self {
            base_url,
            auth_token: config.auth_token.clone(),
            reconnect_delay: config.reconnect_delay,
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        let path = tree::segments(path).join("/");
        match &self.auth_token {
            Some(token) => format!("{}/{}.json?auth={}", self.base_url, path, token),
            None => format!("{}/{}.json", self.base_url, path),
        }
    }
}

#[async_trait]
impl RealtimeStore for FirebaseStore {
    fn subscribe(&self, path: &str) -> Subscription {
        let (sink, subscription) = store::channel(path);
        let url = self.url(path);
        let http = Arc::clone(&self.http);
        let reconnect_delay = self.reconnect_delay;

        tokio::spawn(async move {
            stream_loop(url, http, reconnect_delay, sink).await;
        });

        subscription
    }

    async fn set(&self, path: &str, value: Value) -> crate::Result<()> {
        let response = self.http.put_json(&self.url(path), &value).await?;
        if !response.is_success() {
            return Err(MonitorError::Store(format!(
                "write to {} returned status {}: {}",
                path, response.status, response.body
            )));
        }
        tracing::debug!("Wrote {}", path);
        Ok(())
    }
}

/// Follow the event stream for one path until unsubscribed, reconnecting on failure
async fn stream_loop(
    url: String,
    http: Arc<dyn HttpClient>,
    reconnect_delay: Duration,
    sink: SubscriptionSink,
) {
    loop {
        let result = tokio::select! {
            _ = sink.cancelled() => break,
            result = follow_stream(&url, http.as_ref(), &sink) => result,
        };

        let reason = match result {
            Ok(()) => "event stream closed".to_string(),
            Err(e) => e.to_string(),
        };
        tracing::debug!("Stream for {} interrupted: {}", sink.path(), reason);
        if !sink.send(StoreEvent::Error(reason)) {
            break;
        }

        tokio::select! {
            _ = sink.cancelled() => break,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
    tracing::debug!("Stream loop for {} stopped", sink.path());
}

async fn follow_stream(
    url: &str,
    http: &dyn HttpClient,
    sink: &SubscriptionSink,
) -> crate::Result<()> {
    let mut stream = http.open_event_stream(url).await?;
    let mut parser = EventStreamParser::new();
    let mut node = Value::Null;

    while let Some(chunk) = stream.next_chunk().await? {
        for event in parser.feed(&chunk) {
            if apply_event(&mut node, &event)? {
                let snapshot = Snapshot::new(sink.path(), Some(node.clone()));
                if !sink.send(StoreEvent::Snapshot(snapshot)) {
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

/// Apply one server event to the cached node, returning true when it changed
pub(crate) fn apply_event(node: &mut Value, event: &ServerEvent) -> crate::Result<bool> {
    match event.event.as_str() {
        "put" => {
            let change: ChangePayload = serde_json::from_str(&event.data)?;
            tree::set(node, &tree::segments(&change.path), change.data);
            Ok(true)
        }
        "patch" => {
            let change: ChangePayload = serde_json::from_str(&event.data)?;
            let Value::Object(children) = change.data else {
                return Err(MonitorError::Store(format!(
                    "patch at {} carried a non-object payload",
                    change.path
                )));
            };
            tree::merge(node, &tree::segments(&change.path), children);
            Ok(true)
        }
        "keep-alive" => Ok(false),
        "cancel" => Err(MonitorError::Store(format!(
            "subscription cancelled by server: {}",
            event.data
        ))),
        "auth_revoked" => Err(MonitorError::Store("authorization revoked".to_string())),
        other => {
            tracing::debug!("Ignoring event stream event '{}'", other);
            Ok(false)
        }
    }
}
