//! Notification gateway: permission state and per-device notification history

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::NotificationsConfig;
use crate::model::now_timestamp;
use crate::notifier::{Notification, Notifier};
use crate::paths::DeviceId;
use crate::MonitorError;

/// Whether the user allowed notifications to be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// Not asked yet
    Default,
    Granted,
    Denied,
}

/// A notification received for a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub device_id: String,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub received_at: String,
}

/// Number of records not yet marked as read
pub fn unread_count(history: &[NotificationRecord]) -> usize {
    history.iter().filter(|record| !record.read).count()
}

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn permission(&self) -> PermissionState;

    /// Ask for permission; a denied permission stays denied
    async fn request_permission(&self) -> PermissionState;

    /// History for a device, oldest first
    async fn history(&self, device: &DeviceId) -> Vec<NotificationRecord>;

    async fn mark_as_read(&self, device: &DeviceId, id: &str) -> crate::Result<()>;

    async fn clear_history(&self, device: &DeviceId);

    /// Record a received notification; dropped unless permission is granted
    async fn deliver(
        &self,
        device: &DeviceId,
        title: &str,
        body: &str,
    ) -> Option<NotificationRecord>;
}

#[derive(Debug)]
struct GatewayState {
    permission: PermissionState,
    history: HashMap<DeviceId, VecDeque<NotificationRecord>>,
    next_id: u64,
}

/// In-process gateway that keeps a bounded history and forwards to notifiers
pub struct LocalNotificationGateway {
    state: RwLock<GatewayState>,
    history_size: usize,
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl std::fmt::Debug for LocalNotificationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalNotificationGateway")
            .field("history_size", &self.history_size)
            .field("notifiers", &self.notifiers.len())
            .finish()
    }
}

impl LocalNotificationGateway {
    pub fn new(config: &NotificationsConfig, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self {
            state: RwLock::new(GatewayState {
                permission: config.initial_permission,
                history: HashMap::new(),
                next_id: 1,
            }),
            history_size: config.history_size,
            notifiers,
        }
    }

    /// Hand the record to the notifiers without waiting for them
    fn forward(&self, device: &DeviceId, record: &NotificationRecord) {
        if self.notifiers.is_empty() {
            return;
        }
        let notification = Notification::for_alert(device, &record.title, &record.body);
        let notifiers = self.notifiers.clone();
        let id = record.id.clone();
        tokio::spawn(async move {
            for notifier in &notifiers {
                if let Err(e) = notifier.notify(&notification).await {
                    tracing::warn!(
                        "Forwarding notification {} via '{}' failed: {}",
                        id,
                        notifier.type_name(),
                        e
                    );
                }
            }
        });
    }
}

#[async_trait]
impl NotificationGateway for LocalNotificationGateway {
    async fn permission(&self) -> PermissionState {
        self.state.read().await.permission
    }

    async fn request_permission(&self) -> PermissionState {
        let mut state = self.state.write().await;
        if state.permission == PermissionState::Default {
            state.permission = PermissionState::Granted;
            tracing::info!("Notification permission granted");
        }
        state.permission
    }

    async fn history(&self, device: &DeviceId) -> Vec<NotificationRecord> {
        self.state
            .read()
            .await
            .history
            .get(device)
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn mark_as_read(&self, device: &DeviceId, id: &str) -> crate::Result<()> {
        let mut state = self.state.write().await;
        let record = state
            .history
            .get_mut(device)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| MonitorError::NotificationNotFound(id.to_string()))?;
        record.read = true;
        Ok(())
    }

    async fn clear_history(&self, device: &DeviceId) {
        let removed = self.state.write().await.history.remove(device);
        tracing::debug!(
            "Cleared {} notifications for device {}",
            removed.map_or(0, |r| r.len()),
            device
        );
    }

    async fn deliver(
        &self,
        device: &DeviceId,
        title: &str,
        body: &str,
    ) -> Option<NotificationRecord> {
        let record = {
            let mut state = self.state.write().await;
            if state.permission != PermissionState::Granted {
                tracing::debug!(
                    "Dropping notification for device {}: permission {:?}",
                    device,
                    state.permission
                );
                return None;
            }

            let record = NotificationRecord {
                id: format!("n{}", state.next_id),
                device_id: device.to_string(),
                title: title.to_string(),
                body: body.to_string(),
                read: false,
                received_at: now_timestamp(),
            };
            state.next_id += 1;

            let history = state.history.entry(device.clone()).or_default();
            if history.len() >= self.history_size {
                history.pop_front();
            }
            history.push_back(record.clone());
            record
        };

        self.forward(device, &record);
        Some(record)
    }
}
