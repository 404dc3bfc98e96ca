//! Configuration types for the device monitor

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::notifications::PermissionState;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_device_id")]
    pub device_id: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            store: StoreConfig::default(),
            display: DisplayConfig::default(),
            notifications: NotificationsConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

/// Which realtime store implementation backs the monitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Firebase,
    Memory,
}

/// Realtime store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_reconnect_delay", with = "humantime_serde")]
    pub reconnect_delay: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_store_url(),
            auth_token: None,
            reconnect_delay: default_reconnect_delay(),
        }
    }
}

/// Presentation limits and placeholder values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,
    #[serde(default = "default_max_log_events")]
    pub max_log_events: usize,
    #[serde(default = "default_lpg_warning_level")]
    pub lpg_warning_level: i64,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_alerts: default_max_alerts(),
            max_log_events: default_max_log_events(),
            lpg_warning_level: default_lpg_warning_level(),
            fallback: FallbackConfig::default(),
        }
    }
}

/// Values shown when a store path holds no data yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_fallback_temperature")]
    pub temperature: f64,
    #[serde(default = "default_fallback_humidity")]
    pub humidity: f64,
    #[serde(default = "default_fallback_lpg_level")]
    pub lpg_level: i64,
    #[serde(default = "default_fallback_latitude")]
    pub latitude: f64,
    #[serde(default = "default_fallback_longitude")]
    pub longitude: f64,
    #[serde(default = "default_fallback_alert_type")]
    pub alert_type: String,
    #[serde(default = "default_fallback_alert_message")]
    pub alert_message: String,
    #[serde(default = "default_fallback_event_type")]
    pub event_type: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            temperature: default_fallback_temperature(),
            humidity: default_fallback_humidity(),
            lpg_level: default_fallback_lpg_level(),
            latitude: default_fallback_latitude(),
            longitude: default_fallback_longitude(),
            alert_type: default_fallback_alert_type(),
            alert_message: default_fallback_alert_message(),
            event_type: default_fallback_event_type(),
        }
    }
}

/// Notification gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default = "default_initial_permission")]
    pub initial_permission: PermissionState,
    #[serde(default)]
    pub notifiers: Vec<NotifierConfig>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            initial_permission: default_initial_permission(),
            notifiers: Vec::new(),
        }
    }
}

/// Notifier configuration with tagged enum for extensibility
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotifierConfig {
    #[serde(rename = "pushover")]
    Pushover {
        api_token: String,
        user_key: String,
        /// Prefix of every message title, followed by the house number
        #[serde(default = "default_pushover_title")]
        title: String,
        #[serde(default = "default_pushover_sound")]
        sound: String,
        /// Played for fire and gas alerts, which are also sent at high priority
        #[serde(default = "default_pushover_emergency_sound")]
        emergency_sound: String,
    },
}

impl NotifierConfig {
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Pushover { .. } => "pushover",
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

fn default_device_id() -> String {
    "23".to_string()
}

fn default_store_url() -> String {
    "https://localhost.firebaseio.com".to_string()
}

fn default_reconnect_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_max_alerts() -> usize {
    10
}

fn default_max_log_events() -> usize {
    50
}

fn default_lpg_warning_level() -> i64 {
    1000
}

fn default_fallback_temperature() -> f64 {
    28.5
}

fn default_fallback_humidity() -> f64 {
    65.0
}

fn default_fallback_lpg_level() -> i64 {
    8500
}

fn default_fallback_latitude() -> f64 {
    12.9716
}

fn default_fallback_longitude() -> f64 {
    77.5946
}

fn default_fallback_alert_type() -> String {
    "auto-book".to_string()
}

fn default_fallback_alert_message() -> String {
    "LPG level low, cylinder auto-booking initiated".to_string()
}

fn default_fallback_event_type() -> String {
    "sensor_reading".to_string()
}

fn default_history_size() -> usize {
    100
}

fn default_initial_permission() -> PermissionState {
    PermissionState::Default
}

fn default_pushover_title() -> String {
    "Device Monitor".to_string()
}

fn default_pushover_sound() -> String {
    "pushover".to_string()
}

fn default_pushover_emergency_sound() -> String {
    "siren".to_string()
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::MonitorError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
