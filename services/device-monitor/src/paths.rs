//! Device identity and the store paths namespaced under it

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::MonitorError;

/// Characters the realtime store refuses inside a key
const FORBIDDEN_KEY_CHARS: [char; 6] = ['/', '.', '#', '$', '[', ']'];

/// Stable identifier of one physical device ("house number")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.trim().is_empty() || id.contains(FORBIDDEN_KEY_CHARS) {
            return Err(MonitorError::InvalidDevice(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceId {
    type Error = MonitorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DeviceId::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// All store paths used for one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePaths {
    pub current: String,
    pub alerts: String,
    pub log_events: String,
    pub config: String,
    pub calibrate_command: String,
}

impl DevicePaths {
    pub fn for_device(device: &DeviceId) -> Self {
        let root = format!("/devices/{}", device);
        Self {
            current: format!("{}/current", root),
            alerts: format!("{}/alerts", root),
            log_events: format!("{}/logs/events", root),
            config: format!("{}/config", root),
            calibrate_command: format!("{}/commands/calibrate", root),
        }
    }
}
