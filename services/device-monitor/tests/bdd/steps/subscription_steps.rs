//! BDD step definitions for the subscription lifecycle feature

use std::sync::Arc;

use cucumber::{given, then, when};
use device_monitor::memory::MemoryStore;
use device_monitor::DeviceId;
use serde_json::json;

use crate::world::MonitorWorld;

#[given("an empty realtime store")]
fn empty_store(world: &mut MonitorWorld) {
    world.store = Some(Arc::new(MemoryStore::new()));
}

#[given(expr = "device {string} reports a temperature of {float}")]
fn device_reports(world: &mut MonitorWorld, device: String, temperature: f64) {
    write_reading(world, &device, temperature);
}

#[given(expr = "device {string} has {int} alerts")]
fn device_has_alerts(world: &mut MonitorWorld, device: String, count: usize) {
    let store = world.store.get_or_insert_with(|| Arc::new(MemoryStore::new()));
    for i in 0..count {
        store.write(
            &format!("/devices/{}/alerts/-N{:04}", device, i),
            json!({ "type": "auto-book", "message": format!("alert {}", i), "timestamp": "t" }),
        );
    }
}

#[given(expr = "device {string} has {int} log events")]
fn device_has_log_events(world: &mut MonitorWorld, device: String, count: usize) {
    let store = world.store.get_or_insert_with(|| Arc::new(MemoryStore::new()));
    let events: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "timestamp": format!("t{:04}", i),
                "eventType": "sensor_reading",
                "temperature": 25.0,
                "humidity": 50.0,
                "lpgLevel": i,
                "flameStatus": false,
                "gasLeakStatus": false
            })
        })
        .collect();
    store.write(&format!("/devices/{}/logs/events", device), json!(events));
}

#[given(expr = "the monitor is watching device {string}")]
async fn watching(world: &mut MonitorWorld, device: String) {
    watch(world, &device).await;
}

#[when(expr = "the monitor starts watching device {string}")]
async fn start_watching(world: &mut MonitorWorld, device: String) {
    watch(world, &device).await;
}

#[when(expr = "device {string} reports a temperature of {float}")]
fn device_reports_later(world: &mut MonitorWorld, device: String, temperature: f64) {
    write_reading(world, &device, temperature);
}

#[when(expr = "the monitor switches to device {string}")]
async fn switch_device(world: &mut MonitorWorld, device: String) {
    let device = DeviceId::new(device).expect("valid device id");
    world.monitor().switch_device(device).await;
}

#[when("the monitor stops")]
async fn stop_monitor(world: &mut MonitorWorld) {
    world.monitor().stop().await;
}

#[when(expr = "the connection for {string} fails")]
fn connection_fails(world: &mut MonitorWorld, path: String) {
    world.store().inject_error(&path, "connection reset");
}

#[then("the device should be shown as connected")]
async fn shown_connected(world: &mut MonitorWorld) {
    world.wait_for_state(|s| s.connected).await;
}

#[then("the device should be shown as disconnected")]
async fn shown_disconnected(world: &mut MonitorWorld) {
    world.wait_for_state(|s| !s.connected).await;
}

#[then(expr = "the telemetry should show temperature {float}, humidity {float} and LPG level {int}")]
async fn telemetry_shows(world: &mut MonitorWorld, temperature: f64, humidity: f64, lpg: i64) {
    let state = world
        .wait_for_state(|s| {
            s.device_data
                .as_ref()
                .is_some_and(|d| d.temperature == temperature)
        })
        .await;
    let data = state.device_data.expect("telemetry");
    assert_eq!(data.humidity, humidity);
    assert_eq!(data.lpg_level, lpg);
}

#[then("no flame or gas leak should be reported")]
async fn no_flame_or_leak(world: &mut MonitorWorld) {
    let state = world.wait_for_state(|s| s.device_data.is_some()).await;
    let data = state.device_data.expect("telemetry");
    assert!(!data.flame_status);
    assert!(!data.gas_leak_status);
}

#[then(expr = "the telemetry should show temperature {float}")]
async fn telemetry_temperature(world: &mut MonitorWorld, temperature: f64) {
    world
        .wait_for_state(|s| {
            s.device_data
                .as_ref()
                .is_some_and(|d| d.temperature == temperature)
        })
        .await;
}

#[then(expr = "{int} alerts should be shown")]
async fn alerts_shown(world: &mut MonitorWorld, count: usize) {
    world.wait_for_state(|s| s.alerts.len() == count).await;
}

#[then(expr = "{int} log events should be shown, newest first")]
async fn logs_shown(world: &mut MonitorWorld, count: usize) {
    let state = world.wait_for_state(|s| s.log_events.len() == count).await;
    for pair in state.log_events.windows(2) {
        assert!(pair[0].timestamp > pair[1].timestamp);
    }
}

#[then("no device config should be shown")]
async fn no_config(world: &mut MonitorWorld) {
    let state = world.monitor().snapshot().await;
    assert!(state.config.is_none());
}

#[then(expr = "{int} new subscriptions should have been opened")]
fn new_subscriptions(world: &mut MonitorWorld, count: usize) {
    let opened = world.store().total_subscriptions() - world.subscriptions_before;
    assert_eq!(opened, count);
}

#[then(expr = "{int} subscriptions should be active")]
fn active_subscriptions(world: &mut MonitorWorld, count: usize) {
    assert_eq!(world.store().active_subscriptions(), count);
}

#[then(expr = "no subscription for device {string} should remain")]
fn no_leaked_subscriptions(world: &mut MonitorWorld, device: String) {
    for path in ["current", "alerts", "logs/events", "config"] {
        let path = format!("/devices/{}/{}", device, path);
        assert_eq!(
            world.store().active_subscriptions_at(&path),
            0,
            "subscription for {} leaked",
            path
        );
    }
}

async fn watch(world: &mut MonitorWorld, device: &str) {
    world.build_monitor(device);
    world.monitor().start().await;
    world.subscriptions_before = world.store().total_subscriptions();
}

fn write_reading(world: &mut MonitorWorld, device: &str, temperature: f64) {
    world
        .store
        .get_or_insert_with(|| Arc::new(MemoryStore::new()))
        .write(&format!("/devices/{}/current", device), reading(temperature));
}

fn reading(temperature: f64) -> serde_json::Value {
    json!({
        "temperature": temperature,
        "humidity": 45.0,
        "lpgLevel": 700,
        "flameStatus": false,
        "gasLeakStatus": false,
        "timestamp": "2026-10-18T12:00:00.000Z",
        "location": { "lat": 12.97, "lng": 77.59 }
    })
}
