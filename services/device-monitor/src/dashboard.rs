//! Web dashboard: HTML tabbed view plus JSON API and write actions

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::model;
use crate::monitor::DeviceMonitor;
use crate::notifications::unread_count;
use crate::paths::DeviceId;
use crate::render;
use crate::view::Tab;
use crate::MonitorError;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub monitor: Arc<DeviceMonitor>,
}

#[derive(Debug, Deserialize)]
struct TabQuery {
    tab: Option<String>,
}

impl TabQuery {
    fn tab(&self) -> Result<Tab, ApiError> {
        match &self.tab {
            Some(tab) => tab.parse().map_err(|e: MonitorError| ApiError {
                status: StatusCode::BAD_REQUEST,
                message: e.to_string(),
            }),
            None => Ok(Tab::default()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeviceSwitch {
    device_id: String,
}

/// Error response carrying a status code and a JSON message
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<MonitorError> for ApiError {
    fn from(error: MonitorError) -> Self {
        let status = match &error {
            MonitorError::InvalidDevice(_) | MonitorError::Decode(_) | MonitorError::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            MonitorError::NotificationNotFound(_) => StatusCode::NOT_FOUND,
            MonitorError::Store(_) | MonitorError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!("Request failed: {}", self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Build the dashboard axum router
pub fn build_router(monitor: Arc<DeviceMonitor>) -> Router {
    let dashboard_state = DashboardState { monitor };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/view", get(view_handler))
        .route("/api/state", get(state_handler))
        .route("/api/config", post(save_config_handler))
        .route("/api/calibrate", post(calibrate_handler))
        .route(
            "/api/notifications",
            get(notifications_handler).delete(clear_notifications_handler),
        )
        .route("/api/notifications/permission", post(permission_handler))
        .route("/api/notifications/{id}/read", post(mark_read_handler))
        .route("/api/device", put(switch_device_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(dashboard_state)
}

async fn index_handler(
    State(dashboard): State<DashboardState>,
    Query(query): Query<TabQuery>,
) -> Result<Html<String>, ApiError> {
    let view = dashboard.monitor.compose_view(query.tab()?).await;
    Ok(Html(render::render_page(&view)))
}

async fn view_handler(
    State(dashboard): State<DashboardState>,
    Query(query): Query<TabQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let view = dashboard.monitor.compose_view(query.tab()?).await;
    Ok(Json(view))
}

async fn state_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.monitor.snapshot().await)
}

async fn save_config_handler(
    State(dashboard): State<DashboardState>,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let config = model::decode_config(&body)?;
    dashboard.monitor.save_config(&config).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn calibrate_handler(State(dashboard): State<DashboardState>) -> Result<StatusCode, ApiError> {
    dashboard.monitor.calibrate().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn notifications_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let device = dashboard.monitor.device_id().await;
    let gateway = dashboard.monitor.gateway();
    let history = gateway.history(&device).await;

    Json(json!({
        "device_id": device,
        "permission": gateway.permission().await,
        "unread": unread_count(&history),
        "history": history,
    }))
}

async fn permission_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let permission = dashboard.monitor.gateway().request_permission().await;
    Json(json!({ "permission": permission }))
}

async fn mark_read_handler(
    State(dashboard): State<DashboardState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let device = dashboard.monitor.device_id().await;
    dashboard.monitor.gateway().mark_as_read(&device, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_notifications_handler(State(dashboard): State<DashboardState>) -> StatusCode {
    let device = dashboard.monitor.device_id().await;
    dashboard.monitor.gateway().clear_history(&device).await;
    StatusCode::NO_CONTENT
}

async fn switch_device_handler(
    State(dashboard): State<DashboardState>,
    Json(body): Json<DeviceSwitch>,
) -> Result<impl IntoResponse, ApiError> {
    let device = DeviceId::new(body.device_id)?;
    dashboard.monitor.switch_device(device.clone()).await;
    Ok(Json(json!({ "device_id": device })))
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
