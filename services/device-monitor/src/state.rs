//! View state owned by the monitor and its projection from store snapshots

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::DisplayConfig;
use crate::fallback;
use crate::model::{self, Alert, DeviceConfig, DeviceData, LogEvent};
use crate::store::Snapshot;

/// Everything the dashboard renders for the active device
///
/// Each slot is replaced wholesale by exactly one subscription; absent data is
/// a valid state, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub device_id: String,
    pub generation: u64,
    pub connected: bool,
    pub device_data: Option<DeviceData>,
    pub alerts: Vec<Alert>,
    pub log_events: Vec<LogEvent>,
    pub config: Option<DeviceConfig>,
}

impl ViewState {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            ..Self::default()
        }
    }

    /// Forget the previous device and start a new generation
    pub fn reset(&mut self, device_id: &str, generation: u64) {
        *self = Self {
            device_id: device_id.to_string(),
            generation,
            ..Self::default()
        };
    }

    /// Project a telemetry snapshot; every accepted snapshot marks the device connected
    pub fn apply_telemetry(
        &mut self,
        snapshot: &Snapshot,
        display: &DisplayConfig,
        now: &str,
    ) -> crate::Result<()> {
        let data = match snapshot.value() {
            Some(value) => model::decode_device_data(value)?,
            None => fallback::placeholder_reading(&display.fallback, now),
        };
        self.device_data = Some(data);
        self.connected = true;
        Ok(())
    }

    /// Show the first `max_alerts` alerts; returns all of them
    pub fn apply_alerts(
        &mut self,
        snapshot: &Snapshot,
        display: &DisplayConfig,
        now: &str,
    ) -> crate::Result<Vec<Alert>> {
        let alerts = match snapshot.value() {
            Some(value) => model::decode_alerts(value)?,
            None => vec![fallback::placeholder_alert(&display.fallback, now)],
        };
        self.alerts = model::truncate_alerts(alerts.clone(), display.max_alerts);
        Ok(alerts)
    }

    pub fn apply_log_events(
        &mut self,
        snapshot: &Snapshot,
        display: &DisplayConfig,
        now: &str,
    ) -> crate::Result<()> {
        let events = match snapshot.value() {
            Some(value) => model::decode_log_events(value)?,
            None => vec![fallback::placeholder_log_event(&display.fallback, now)],
        };
        self.log_events = model::newest_first(events, display.max_log_events);
        Ok(())
    }

    /// Config has no placeholder: an empty path clears it
    pub fn apply_config(&mut self, snapshot: &Snapshot) -> crate::Result<()> {
        self.config = match snapshot.value() {
            Some(value) => Some(model::decode_config(value)?),
            None => None,
        };
        Ok(())
    }

    /// Transport failure: keep the last known data, only flip the flag
    pub fn mark_disconnected(&mut self) {
        self.connected = false;
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<ViewState>>;

pub fn new_state_handle(device_id: &str) -> StateHandle {
    Arc::new(RwLock::new(ViewState::new(device_id)))
}
