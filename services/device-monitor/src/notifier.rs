//! Off-device delivery of device alerts

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::paths::DeviceId;

/// How urgently an alert has to reach the household
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Routine,
    Warning,
    /// Fire or gas in the house
    Emergency,
}

impl Urgency {
    /// Classify an alert by the `type` the device firmware reported
    pub fn of_alert(kind: &str) -> Self {
        let kind = kind.to_ascii_lowercase().replace('-', "_");
        if kind.contains("flame") || kind.contains("fire") || kind.contains("gas_leak") {
            Urgency::Emergency
        } else if kind.contains("lpg") || kind.contains("warning") || kind.contains("temperature")
        {
            Urgency::Warning
        } else {
            Urgency::Routine
        }
    }
}

/// An alert of one house, ready to leave the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub device_id: String,
    pub kind: String,
    pub message: String,
    pub urgency: Urgency,
}

impl Notification {
    pub fn for_alert(device: &DeviceId, kind: &str, message: &str) -> Self {
        Self {
            device_id: device.to_string(),
            kind: kind.to_string(),
            message: message.to_string(),
            urgency: Urgency::of_alert(kind),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Short name used in logs (e.g. "pushover")
    fn type_name(&self) -> &str;

    async fn notify(&self, notification: &Notification) -> crate::Result<()>;
}
