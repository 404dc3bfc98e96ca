//! BDD step definitions for the notifications feature

use std::sync::Arc;

use cucumber::{given, then, when};
use device_monitor::config::NotifierConfig;
use device_monitor::io::{ByteStream, HttpClient, HttpResponse};
use device_monitor::notifications::{unread_count, NotificationGateway};
use device_monitor::notifier::Notification;
use device_monitor::pushover::PushoverNotifier;
use device_monitor::view::Tab;
use device_monitor::{DeviceId, MonitorError};
use serde_json::{json, Value};

use crate::world::MonitorWorld;

fn test_notifier_config() -> NotifierConfig {
    NotifierConfig::Pushover {
        api_token: "test-token".to_string(),
        user_key: "test-user".to_string(),
        title: "Device Monitor".to_string(),
        sound: "pushover".to_string(),
        emergency_sound: "siren".to_string(),
    }
}

/// HTTP client answering every form post with a fixed status
struct FixedStatusClient {
    status: u16,
}

#[async_trait::async_trait]
impl HttpClient for FixedStatusClient {
    async fn put_json(&self, _url: &str, _body: &Value) -> device_monitor::Result<HttpResponse> {
        Err(MonitorError::Http("unexpected PUT".to_string()))
    }

    async fn post_form(
        &self,
        _url: &str,
        _params: &[(&str, &str)],
    ) -> device_monitor::Result<HttpResponse> {
        Ok(HttpResponse {
            status: self.status,
            body: r#"{"status":1}"#.to_string(),
        })
    }

    async fn open_event_stream(&self, _url: &str) -> device_monitor::Result<Box<dyn ByteStream>> {
        Err(MonitorError::Http("unexpected stream".to_string()))
    }
}

async fn device(world: &MonitorWorld) -> DeviceId {
    world.monitor().device_id().await
}

#[given(expr = "{int} notifications were received")]
async fn notifications_received(world: &mut MonitorWorld, count: usize) {
    let device = device(world).await;
    for i in 0..count {
        world
            .gateway()
            .deliver(&device, "auto-book", &format!("notification {}", i))
            .await
            .expect("permission granted");
    }
}

#[when("the first notification is marked as read")]
async fn mark_first_read(world: &mut MonitorWorld) {
    let device = device(world).await;
    let history = world.gateway().history(&device).await;
    let first = history.first().expect("at least one notification");
    world
        .gateway()
        .mark_as_read(&device, &first.id)
        .await
        .expect("known notification");
}

#[when("the notification history is cleared")]
async fn clear_history(world: &mut MonitorWorld) {
    let device = device(world).await;
    world.gateway().clear_history(&device).await;
}

#[when(expr = "device {string} raises an alert {string}")]
fn raise_alert(world: &mut MonitorWorld, device: String, message: String) {
    let alerts = format!("/devices/{}/alerts", device);
    let existing = world
        .store()
        .value_at(&alerts)
        .and_then(|v| v.as_object().map(|m| m.len()))
        .unwrap_or(0);
    let key = format!("-Z{:08}", existing);
    world.store().write(
        &format!("{}/{}", alerts, key),
        json!({ "type": "gas_leak", "message": message, "timestamp": "t" }),
    );
}

#[then(expr = "the unread count should be {int}")]
async fn unread_is(world: &mut MonitorWorld, count: usize) {
    let device = device(world).await;
    let history = world.gateway().history(&device).await;
    assert_eq!(unread_count(&history), count);
}

#[then(expr = "the notifications tab should be labelled {string}")]
async fn notifications_label(world: &mut MonitorWorld, label: String) {
    let view = world.monitor().compose_view(Tab::Notifications).await;
    let tab = view
        .tabs
        .iter()
        .find(|t| t.tab == Tab::Notifications)
        .expect("notifications tab");
    assert_eq!(tab.label, label);
}

#[then(expr = "a notification {string} should be received")]
async fn notification_received(world: &mut MonitorWorld, message: String) {
    let device = device(world).await;
    for _ in 0..200 {
        let history = world.gateway().history(&device).await;
        if history.iter().any(|r| r.body == message) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("notification '{}' was not received", message);
}

#[then("no notification should have been received")]
async fn nothing_received(world: &mut MonitorWorld) {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let device = device(world).await;
    assert!(world.gateway().history(&device).await.is_empty());
}

#[given("a Pushover notifier with valid credentials")]
fn pushover_valid(world: &mut MonitorWorld) {
    let notifier = PushoverNotifier::new(
        &test_notifier_config(),
        Arc::new(FixedStatusClient { status: 200 }),
    );
    world.notifier = Some(Box::new(notifier));
}

#[given("a Pushover notifier that returns an API error")]
fn pushover_api_error(world: &mut MonitorWorld) {
    let notifier = PushoverNotifier::new(
        &test_notifier_config(),
        Arc::new(FixedStatusClient { status: 400 }),
    );
    world.notifier = Some(Box::new(notifier));
}

#[when(expr = "a {string} alert {string} is sent for device {string}")]
async fn send_notification(world: &mut MonitorWorld, kind: String, message: String, device: String) {
    let notifier = world.notifier.as_ref().expect("notifier not set");
    let device = DeviceId::new(device).expect("valid device id");
    let notification = Notification::for_alert(&device, &kind, &message);
    world.notification_result = Some(notifier.notify(&notification).await);
}

#[then("the notification should succeed")]
fn notification_succeeds(world: &mut MonitorWorld) {
    let result = world.notification_result.as_ref().expect("no result");
    result.as_ref().unwrap();
}

#[then("the notification should fail with an error")]
fn notification_fails(world: &mut MonitorWorld) {
    let result = world.notification_result.as_ref().expect("no result");
    assert!(result.is_err());
}
