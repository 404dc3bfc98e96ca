//! Tabbed view composition
//!
//! Every panel is a pure function of the view state and the notification
//! gateway; nothing here holds state of its own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DisplayConfig;
use crate::model::{Alert, DeviceConfig, DeviceData, Location, LogEvent};
use crate::notifications::{unread_count, NotificationRecord, PermissionState};
use crate::state::ViewState;
use crate::MonitorError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Dashboard,
    Alerts,
    Notifications,
    Location,
    Config,
    Logs,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Dashboard,
        Tab::Alerts,
        Tab::Notifications,
        Tab::Location,
        Tab::Config,
        Tab::Logs,
    ];

    /// Identifier used in URLs (`?tab=`)
    pub fn slug(&self) -> &'static str {
        match self {
            Tab::Dashboard => "dashboard",
            Tab::Alerts => "alerts",
            Tab::Notifications => "notifications",
            Tab::Location => "location",
            Tab::Config => "config",
            Tab::Logs => "logs",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Alerts => "Alerts",
            Tab::Notifications => "Notifications",
            Tab::Location => "Location",
            Tab::Config => "Config",
            Tab::Logs => "Logs",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Tab {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|tab| tab.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MonitorError::Dashboard(format!("Unknown tab '{}'", s)))
    }
}

/// Indicator lights shown next to the telemetry panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusLeds {
    pub connected: bool,
    pub flame: bool,
    pub gas_leak: bool,
    pub lpg_warning: bool,
}

/// One display component with the data it renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "component", rename_all = "snake_case")]
pub enum Panel {
    Dashboard {
        connected: bool,
        data: Option<DeviceData>,
    },
    StatusLeds(StatusLeds),
    Alerts {
        alerts: Vec<Alert>,
    },
    NotificationSetup {
        permission: PermissionState,
    },
    NotificationHistory {
        unread: usize,
        records: Vec<NotificationRecord>,
    },
    LocationTracker {
        location: Option<Location>,
        map_url: Option<String>,
    },
    ConfigPanel {
        config: Option<DeviceConfig>,
    },
    CalibrationPanel {
        device_id: String,
    },
    EventLogs {
        events: Vec<LogEvent>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabLabel {
    pub tab: Tab,
    pub label: String,
    pub active: bool,
}

/// The composed page for one tab
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub device_id: String,
    pub connected: bool,
    pub unread: usize,
    pub tabs: Vec<TabLabel>,
    pub active: Tab,
    pub panels: Vec<Panel>,
}

pub fn tab_label(tab: Tab, unread: usize) -> String {
    if tab == Tab::Notifications && unread > 0 {
        format!("{} ({})", tab.title(), unread)
    } else {
        tab.title().to_string()
    }
}

pub fn status_leds(state: &ViewState, display: &DisplayConfig) -> StatusLeds {
    let data = state.device_data.as_ref();
    StatusLeds {
        connected: state.connected,
        flame: data.is_some_and(|d| d.flame_status),
        gas_leak: data.is_some_and(|d| d.gas_leak_status),
        lpg_warning: data.is_some_and(|d| d.lpg_level > display.lpg_warning_level),
    }
}

pub fn map_url(location: &Location) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={lat}&mlon={lng}#map=16/{lat}/{lng}",
        lat = location.lat,
        lng = location.lng
    )
}

/// Compose the view of `active`; the unread count is derived from `history` on every call
pub fn compose(
    state: &ViewState,
    permission: PermissionState,
    history: &[NotificationRecord],
    display: &DisplayConfig,
    active: Tab,
) -> DashboardView {
    let unread = unread_count(history);

    let tabs = Tab::ALL
        .into_iter()
        .map(|tab| TabLabel {
            tab,
            label: tab_label(tab, unread),
            active: tab == active,
        })
        .collect();

    let panels = match active {
        Tab::Dashboard => vec![
            Panel::Dashboard {
                connected: state.connected,
                data: state.device_data.clone(),
            },
            Panel::StatusLeds(status_leds(state, display)),
        ],
        Tab::Alerts => vec![Panel::Alerts {
            alerts: state.alerts.clone(),
        }],
        Tab::Notifications => vec![
            Panel::NotificationSetup { permission },
            Panel::NotificationHistory {
                unread,
                records: history.to_vec(),
            },
        ],
        Tab::Location => {
            let location = state.device_data.as_ref().map(|d| d.location);
            vec![Panel::LocationTracker {
                location,
                map_url: location.as_ref().map(map_url),
            }]
        }
        Tab::Config => vec![
            Panel::ConfigPanel {
                config: state.config.clone(),
            },
            Panel::CalibrationPanel {
                device_id: state.device_id.clone(),
            },
        ],
        Tab::Logs => vec![Panel::EventLogs {
            events: state.log_events.clone(),
        }],
    };

    DashboardView {
        device_id: state.device_id.clone(),
        connected: state.connected,
        unread,
        tabs,
        active,
        panels,
    }
}
