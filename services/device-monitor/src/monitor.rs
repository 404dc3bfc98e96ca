//! DeviceMonitor: owns the device identity, its four subscriptions and the write actions

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::DisplayConfig;
use crate::fallback::PLACEHOLDER_ALERT_ID;
use crate::model::{now_timestamp, Alert, DeviceConfig};
use crate::notifications::NotificationGateway;
use crate::paths::{DeviceId, DevicePaths};
use crate::state::{new_state_handle, StateHandle, ViewState};
use crate::store::{RealtimeStore, StoreEvent, Subscription, SubscriptionHandle};
use crate::view::{self, DashboardView, Tab};

const CALIBRATE_COMMAND: &str = "START_CALIBRATION";

/// The four store paths a monitor follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Telemetry,
    Alerts,
    LogEvents,
    Config,
}

impl Slot {
    const ALL: [Slot; 4] = [Slot::Telemetry, Slot::Alerts, Slot::LogEvents, Slot::Config];

    fn path(self, paths: &DevicePaths) -> &str {
        match self {
            Slot::Telemetry => &paths.current,
            Slot::Alerts => &paths.alerts,
            Slot::LogEvents => &paths.log_events,
            Slot::Config => &paths.config,
        }
    }
}

/// Live subscriptions of one generation
struct Active {
    handles: Vec<SubscriptionHandle>,
    tasks: Vec<JoinHandle<()>>,
}

struct Session {
    device: DeviceId,
    generation: u64,
    active: Option<Active>,
}

/// Composition root of the dashboard
///
/// Subscribes to telemetry, alerts, the event log and config of one device,
/// projects every snapshot into [`ViewState`] and exposes the two write
/// actions. Switching device tears all four subscriptions down before fresh
/// ones are opened.
pub struct DeviceMonitor {
    store: Arc<dyn RealtimeStore>,
    gateway: Arc<dyn NotificationGateway>,
    display: Arc<DisplayConfig>,
    state: StateHandle,
    session: Mutex<Session>,
}

impl std::fmt::Debug for DeviceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceMonitor")
            .field("display", &self.display)
            .finish()
    }
}

impl DeviceMonitor {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        gateway: Arc<dyn NotificationGateway>,
        device: DeviceId,
        display: DisplayConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            display: Arc::new(display),
            state: new_state_handle(device.as_str()),
            session: Mutex::new(Session {
                device,
                generation: 0,
                active: None,
            }),
        }
    }

    pub fn state(&self) -> StateHandle {
        Arc::clone(&self.state)
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.read().await.clone()
    }

    pub async fn device_id(&self) -> DeviceId {
        self.session.lock().await.device.clone()
    }

    pub fn gateway(&self) -> &Arc<dyn NotificationGateway> {
        &self.gateway
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    pub async fn is_running(&self) -> bool {
        self.session.lock().await.active.is_some()
    }

    /// Open the four subscriptions; no-op when already running
    pub async fn start(&self) {
        let mut session = self.session.lock().await;
        if session.active.is_some() {
            return;
        }
        session.active = Some(self.subscribe_all(&session.device, session.generation));
        tracing::info!("Monitoring device {}", session.device);
    }

    /// Close all subscriptions; safe to call any number of times
    pub async fn stop(&self) {
        let mut session = self.session.lock().await;
        if let Some(active) = session.active.take() {
            teardown(active).await;
            self.state.write().await.mark_disconnected();
            tracing::info!("Stopped monitoring device {}", session.device);
        }
    }

    /// Follow a different device, discarding everything known about the previous one
    pub async fn switch_device(&self, device: DeviceId) {
        let mut session = self.session.lock().await;
        if session.device == device {
            tracing::debug!("Already monitoring device {}", device);
            return;
        }

        let was_running = match session.active.take() {
            Some(active) => {
                teardown(active).await;
                true
            }
            None => false,
        };

        session.generation += 1;
        self.state
            .write()
            .await
            .reset(device.as_str(), session.generation);
        tracing::info!(
            "Switching from device {} to {} (generation {})",
            session.device,
            device,
            session.generation
        );
        session.device = device;

        if was_running {
            session.active = Some(self.subscribe_all(&session.device, session.generation));
        }
    }

    /// Overwrite the device config; the view picks the change up from the store echo
    pub async fn save_config(&self, config: &DeviceConfig) -> crate::Result<()> {
        let device = self.device_id().await;
        let path = DevicePaths::for_device(&device).config;
        self.store.set(&path, config.clone().into_value()).await?;
        tracing::info!("Saved config for device {}", device);
        Ok(())
    }

    /// Ask the device to calibrate; success means the command was written
    pub async fn calibrate(&self) -> crate::Result<()> {
        let device = self.device_id().await;
        let path = DevicePaths::for_device(&device).calibrate_command;
        let command = json!({
            "command": CALIBRATE_COMMAND,
            "timestamp": now_timestamp(),
        });
        self.store.set(&path, command).await?;
        tracing::info!("Calibration requested for device {}", device);
        Ok(())
    }

    pub async fn compose_view(&self, tab: Tab) -> DashboardView {
        let state = self.snapshot().await;
        let device = self.device_id().await;
        let permission = self.gateway.permission().await;
        let history = self.gateway.history(&device).await;
        view::compose(&state, permission, &history, &self.display, tab)
    }

    fn subscribe_all(&self, device: &DeviceId, generation: u64) -> Active {
        let paths = DevicePaths::for_device(device);
        let mut handles = Vec::with_capacity(Slot::ALL.len());
        let mut tasks = Vec::with_capacity(Slot::ALL.len());

        for slot in Slot::ALL {
            let subscription = self.store.subscribe(slot.path(&paths));
            handles.push(subscription.handle());

            let pump = Pump {
                slot,
                device: device.clone(),
                generation,
                state: Arc::clone(&self.state),
                gateway: Arc::clone(&self.gateway),
                display: Arc::clone(&self.display),
            };
            tasks.push(tokio::spawn(pump.run(subscription)));
        }

        tracing::debug!(
            "Opened {} subscriptions for device {} (generation {})",
            handles.len(),
            device,
            generation
        );
        Active { handles, tasks }
    }
}

async fn teardown(active: Active) {
    for handle in &active.handles {
        handle.unsubscribe();
    }
    for task in active.tasks {
        if let Err(e) = task.await {
            tracing::warn!("Subscription task ended abnormally: {}", e);
        }
    }
}

/// Drives one subscription into its state slot
struct Pump {
    slot: Slot,
    device: DeviceId,
    generation: u64,
    state: StateHandle,
    gateway: Arc<dyn NotificationGateway>,
    display: Arc<DisplayConfig>,
}

impl Pump {
    async fn run(self, mut subscription: Subscription) {
        let mut seen_alerts: Option<HashSet<String>> = None;
        let handle = subscription.handle();

        while let Some(event) = subscription.next().await {
            let Some(alerts) = self.handle(event).await else {
                continue;
            };
            let fresh = new_alerts(&mut seen_alerts, &alerts);
            if fresh.is_empty() {
                continue;
            }

            let delivery = async {
                for alert in &fresh {
                    self.gateway
                        .deliver(&self.device, &alert.kind, &alert.message)
                        .await;
                }
            };
            let interrupted = tokio::select! {
                biased;
                _ = handle.cancelled() => true,
                _ = delivery => false,
            };
            if interrupted {
                tracing::debug!(
                    "Dropped {} pending alert notifications for device {}",
                    fresh.len(),
                    self.device
                );
                break;
            }
        }

        tracing::debug!(
            "{:?} subscription for device {} closed",
            self.slot,
            self.device
        );
    }

    /// Apply one event; an accepted alerts snapshot yields every decoded alert,
    /// including those beyond the display limit
    async fn handle(&self, event: StoreEvent) -> Option<Vec<Alert>> {
        let mut state = self.state.write().await;
        if state.generation != self.generation {
            tracing::debug!(
                "Discarding {:?} event from superseded generation {}",
                self.slot,
                self.generation
            );
            return None;
        }

        let snapshot = match event {
            StoreEvent::Snapshot(snapshot) => snapshot,
            StoreEvent::Error(message) => {
                tracing::warn!(
                    "{:?} subscription for device {} interrupted: {}",
                    self.slot,
                    self.device,
                    message
                );
                state.mark_disconnected();
                return None;
            }
        };

        let now = now_timestamp();
        let result = match self.slot {
            Slot::Telemetry => state
                .apply_telemetry(&snapshot, &self.display, &now)
                .map(|()| None),
            Slot::Alerts => state.apply_alerts(&snapshot, &self.display, &now).map(Some),
            Slot::LogEvents => state
                .apply_log_events(&snapshot, &self.display, &now)
                .map(|()| None),
            Slot::Config => state.apply_config(&snapshot).map(|()| None),
        };

        match result {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::warn!("Rejected snapshot of {}: {}", snapshot.path, e);
                None
            }
        }
    }
}

/// Alerts not seen before; the first call only records what is already there
fn new_alerts(seen: &mut Option<HashSet<String>>, alerts: &[Alert]) -> Vec<Alert> {
    let real = alerts.iter().filter(|a| a.id != PLACEHOLDER_ALERT_ID);
    match seen {
        None => {
            *seen = Some(real.map(|a| a.id.clone()).collect());
            Vec::new()
        }
        Some(seen) => real.filter(|a| seen.insert(a.id.clone())).cloned().collect(),
    }
}
