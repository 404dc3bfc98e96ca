//! BDD step definitions for the write actions feature

use cucumber::{then, when};
use device_monitor::model::DeviceConfig;
use serde_json::{Map, Value};

use crate::world::MonitorWorld;

#[when(expr = "the config field {string} is saved as {string}")]
async fn save_config(world: &mut MonitorWorld, key: String, value: String) {
    let mut config = DeviceConfig::default();
    config.0.insert(key, Value::String(value));
    world.write_result = Some(world.monitor().save_config(&config).await);
}

#[when("calibration is requested")]
async fn calibrate(world: &mut MonitorWorld) {
    world.write_result = Some(world.monitor().calibrate().await);
}

#[then("the write should succeed")]
fn write_succeeds(world: &mut MonitorWorld) {
    let result = world.write_result.as_ref().expect("no write result");
    result.as_ref().unwrap();
}

#[then(expr = "the store should hold {string} as {string} at {string}")]
fn store_holds(world: &mut MonitorWorld, key: String, value: String, path: String) {
    let stored = world.store().value_at(&path).expect("value at path");
    let mut expected = Map::new();
    expected.insert(key, Value::String(value));
    assert_eq!(stored, Value::Object(expected));
}

#[then(expr = "exactly {int} write should have been made to {string}")]
fn write_count(world: &mut MonitorWorld, count: usize, path: String) {
    let writes = world
        .store()
        .writes()
        .into_iter()
        .filter(|(p, _)| *p == path)
        .count();
    assert_eq!(writes, count);
}

#[then(expr = "the device config should eventually show {string} as {string}")]
async fn config_shows(world: &mut MonitorWorld, key: String, value: String) {
    world
        .wait_for_state(|s| {
            s.config
                .as_ref()
                .and_then(|c| c.0.get(&key))
                .is_some_and(|v| v == &Value::String(value.clone()))
        })
        .await;
}

#[then(expr = "the calibration command at {string} should be {string}")]
fn calibration_command(world: &mut MonitorWorld, path: String, command: String) {
    let value = world.store().value_at(&path).expect("calibration command");
    assert_eq!(value["command"], Value::String(command));
    assert!(value["timestamp"].is_string());
}
