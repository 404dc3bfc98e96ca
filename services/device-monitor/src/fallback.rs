//! Placeholder values used when a device path holds no data

use crate::config::FallbackConfig;
use crate::model::{Alert, DeviceData, Location, LogEvent};

/// Id carried by the synthetic alert, never delivered as a notification
pub const PLACEHOLDER_ALERT_ID: &str = "placeholder";

pub fn placeholder_reading(fallback: &FallbackConfig, now: &str) -> DeviceData {
    DeviceData {
        temperature: fallback.temperature,
        humidity: fallback.humidity,
        lpg_level: fallback.lpg_level,
        flame_status: false,
        gas_leak_status: false,
        timestamp: now.to_string(),
        location: Location {
            lat: fallback.latitude,
            lng: fallback.longitude,
        },
    }
}

pub fn placeholder_alert(fallback: &FallbackConfig, now: &str) -> Alert {
    Alert {
        id: PLACEHOLDER_ALERT_ID.to_string(),
        kind: fallback.alert_type.clone(),
        message: fallback.alert_message.clone(),
        timestamp: now.to_string(),
    }
}

pub fn placeholder_log_event(fallback: &FallbackConfig, now: &str) -> LogEvent {
    LogEvent {
        timestamp: now.to_string(),
        event_type: fallback.event_type.clone(),
        temperature: fallback.temperature,
        humidity: fallback.humidity,
        lpg_level: fallback.lpg_level,
        flame_status: false,
        gas_leak_status: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reading_matches_demo_values() {
        let reading = placeholder_reading(&FallbackConfig::default(), "now");
        assert_eq!(reading.temperature, 28.5);
        assert_eq!(reading.humidity, 65.0);
        assert_eq!(reading.lpg_level, 8500);
        assert!(!reading.flame_status);
        assert!(!reading.gas_leak_status);
        assert_eq!(reading.timestamp, "now");
    }

    #[test]
    fn placeholder_alert_uses_reserved_id() {
        let alert = placeholder_alert(&FallbackConfig::default(), "now");
        assert_eq!(alert.id, PLACEHOLDER_ALERT_ID);
        assert_eq!(alert.kind, "auto-book");
    }
}
