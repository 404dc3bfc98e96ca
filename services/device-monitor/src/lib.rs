//! Device Monitor - IoT gas and fire safety dashboard
//!
//! Follows one device in a realtime data store, projects its telemetry,
//! alerts, event log and config into a tabbed view, and writes config and
//! calibration commands back.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod fallback;
pub mod firebase;
pub mod io;
pub mod memory;
pub mod model;
pub mod monitor;
pub mod notifications;
pub mod notifier;
pub mod paths;
pub mod pushover;
pub mod render;
pub mod sse;
pub mod state;
pub mod store;
pub mod tree;
pub mod view;

pub use config::{load_config, Config};
pub use error::{MonitorError, Result};
pub use monitor::DeviceMonitor;
pub use paths::DeviceId;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{NotifierConfig, StoreBackend};
use crate::firebase::FirebaseStore;
use crate::io::ReqwestHttpClient;
use crate::memory::MemoryStore;
use crate::notifications::LocalNotificationGateway;
use crate::notifier::Notifier;
use crate::pushover::PushoverNotifier;
use crate::store::RealtimeStore;

/// Run the device monitor with the given configuration until ctrl-c
pub async fn run(config: Config) -> Result<()> {
    let device = DeviceId::new(config.device_id.clone())?;
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new());
    let cancel = CancellationToken::new();

    let store: Arc<dyn RealtimeStore> = match config.store.backend {
        StoreBackend::Firebase => Arc::new(FirebaseStore::new(&config.store, Arc::clone(&http))),
        StoreBackend::Memory => {
            tracing::info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // Build notifiers
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
    for notifier_config in &config.notifications.notifiers {
        tracing::info!("Forwarding alerts via {}", notifier_config.type_name());
        let notifier: Arc<dyn Notifier> = match notifier_config {
            NotifierConfig::Pushover { .. } => {
                Arc::new(PushoverNotifier::new(notifier_config, Arc::clone(&http)))
            }
        };
        notifiers.push(notifier);
    }

    let gateway = Arc::new(LocalNotificationGateway::new(
        &config.notifications,
        notifiers,
    ));
    let monitor = Arc::new(DeviceMonitor::new(
        store,
        gateway,
        device,
        config.display.clone(),
    ));

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c");
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    monitor.start().await;

    // Start dashboard if enabled
    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let dashboard_monitor = Arc::clone(&monitor);
        let cancel_for_dashboard = cancel.clone();

        tokio::spawn(async move {
            let router = dashboard::build_router(dashboard_monitor);
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }

    tracing::info!("Device monitor started");

    cancel.cancelled().await;

    monitor.stop().await;
    tracing::info!("Device monitor stopped");

    Ok(())
}
