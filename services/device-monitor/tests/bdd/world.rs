//! BDD test world for the device monitor

use std::sync::Arc;
use std::time::Duration;

use cucumber::World;
use device_monitor::config::{DisplayConfig, NotificationsConfig};
use device_monitor::memory::MemoryStore;
use device_monitor::notifications::{LocalNotificationGateway, PermissionState};
use device_monitor::notifier::Notifier;
use device_monitor::state::ViewState;
use device_monitor::{DeviceId, DeviceMonitor};

#[derive(Debug, Default, World)]
pub struct MonitorWorld {
    // Subscription testing
    pub store: Option<Arc<MemoryStore>>,
    pub monitor: Option<Arc<DeviceMonitor>>,
    pub gateway: Option<Arc<LocalNotificationGateway>>,
    pub subscriptions_before: usize,

    // Write testing
    pub write_result: Option<device_monitor::Result<()>>,

    // Notifier testing
    pub notifier: Option<Box<dyn Notifier>>,
    pub notification_result: Option<device_monitor::Result<()>>,
}

impl MonitorWorld {
    pub fn store(&self) -> &Arc<MemoryStore> {
        self.store.as_ref().expect("store not set")
    }

    pub fn monitor(&self) -> &Arc<DeviceMonitor> {
        self.monitor.as_ref().expect("monitor not started")
    }

    pub fn gateway(&self) -> &Arc<LocalNotificationGateway> {
        self.gateway.as_ref().expect("gateway not set")
    }

    /// Build a monitor for `device` on the world's store with notifications granted
    pub fn build_monitor(&mut self, device: &str) {
        let store = Arc::clone(self.store.get_or_insert_with(|| Arc::new(MemoryStore::new())));
        let config = NotificationsConfig {
            initial_permission: PermissionState::Granted,
            ..NotificationsConfig::default()
        };
        let gateway = Arc::new(LocalNotificationGateway::new(&config, Vec::new()));
        let monitor = DeviceMonitor::new(
            store,
            Arc::clone(&gateway) as Arc<dyn device_monitor::notifications::NotificationGateway>,
            DeviceId::new(device).expect("valid device id"),
            DisplayConfig::default(),
        );
        self.gateway = Some(gateway);
        self.monitor = Some(Arc::new(monitor));
    }

    /// Poll the view state until `condition` holds
    pub async fn wait_for_state(&self, condition: impl Fn(&ViewState) -> bool) -> ViewState {
        for _ in 0..200 {
            let state = self.monitor().snapshot().await;
            if condition(&state) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("view state did not reach the expected condition");
    }
}
