//! Typed shapes of the values stored under a device, and their decoding
//!
//! Telemetry and config snapshots are validated as a whole: a payload that does
//! not match its shape is rejected. Collections (alerts, log events) are decoded
//! entry by entry and malformed entries are skipped.

use chrono::{SecondsFormat, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::MonitorError;

/// GPS position of a device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Latest telemetry reading of a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceData {
    pub temperature: f64,
    pub humidity: f64,
    #[serde(deserialize_with = "whole_number")]
    pub lpg_level: i64,
    pub flame_status: bool,
    pub gas_leak_status: bool,
    pub timestamp: String,
    pub location: Location,
}

/// An alert raised by a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub timestamp: String,
}

/// One entry of the device event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub timestamp: String,
    pub event_type: String,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(deserialize_with = "whole_number")]
    pub lpg_level: i64,
    pub flame_status: bool,
    pub gas_leak_status: bool,
}

/// Opaque device configuration, passed through verbatim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceConfig(pub Map<String, Value>);

impl DeviceConfig {
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

pub fn decode_device_data(value: &Value) -> crate::Result<DeviceData> {
    decode_whole(value, "telemetry")
}

pub fn decode_config(value: &Value) -> crate::Result<DeviceConfig> {
    decode_whole(value, "config")
}

/// Decode an alert collection in store order
///
/// Entries without an `id` field take their key in the collection.
pub fn decode_alerts(value: &Value) -> crate::Result<Vec<Alert>> {
    let alerts = collection_entries(value, "alerts")?
        .into_iter()
        .filter_map(|(key, entry)| {
            let mut alert: Alert = decode_entry(entry, &key, "alert")?;
            if alert.id.is_empty() {
                alert.id = key;
            }
            Some(alert)
        })
        .collect();
    Ok(alerts)
}

/// Decode a log event collection in chronological (store) order
pub fn decode_log_events(value: &Value) -> crate::Result<Vec<LogEvent>> {
    let events = collection_entries(value, "log events")?
        .into_iter()
        .filter_map(|(key, entry)| decode_entry(entry, &key, "log event"))
        .collect();
    Ok(events)
}

/// Keep the first `max` alerts in store order
pub fn truncate_alerts(alerts: Vec<Alert>, max: usize) -> Vec<Alert> {
    alerts.into_iter().take(max).collect()
}

/// Keep the last `max` chronological events, newest first
pub fn newest_first(events: Vec<LogEvent>, max: usize) -> Vec<LogEvent> {
    let skip = events.len().saturating_sub(max);
    events.into_iter().skip(skip).rev().collect()
}

/// Current wall-clock time as an ISO-8601 UTC timestamp with milliseconds
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Integer that some firmware sends as a float (`8500.0`); fractions are rejected
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = Number::deserialize(deserializer)?;
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => Ok(f as i64),
        _ => Err(D::Error::custom(format!(
            "expected a whole number, got {}",
            number
        ))),
    }
}

fn decode_whole<T: DeserializeOwned>(value: &Value, what: &str) -> crate::Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| MonitorError::Decode(format!("malformed {} snapshot: {}", what, e)))
}

fn decode_entry<T: DeserializeOwned>(entry: &Value, key: &str, what: &str) -> Option<T> {
    match serde_json::from_value(entry.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!("Skipping malformed {} '{}': {}", what, key, e);
            None
        }
    }
}

/// Flatten a collection node into `(key, entry)` pairs in store order
///
/// Objects are ordered by key (store-generated keys sort chronologically);
/// all-numeric keys are ordered numerically. Array holes are skipped.
fn collection_entries<'a>(value: &'a Value, what: &str) -> crate::Result<Vec<(String, &'a Value)>> {
    match value {
        Value::Array(items) => Ok(items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(index, item)| (index.to_string(), item))
            .collect()),
        Value::Object(map) => {
            let mut entries: Vec<(String, &Value)> =
                map.iter().map(|(k, v)| (k.clone(), v)).collect();
            if entries.iter().all(|(k, _)| k.parse::<u64>().is_ok()) {
                entries.sort_by_key(|(k, _)| k.parse::<u64>().unwrap_or(u64::MAX));
            }
            Ok(entries)
        }
        other => Err(MonitorError::Decode(format!(
            "{} snapshot must be an object or array, got {}",
            what,
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
