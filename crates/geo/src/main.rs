use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::sync::RwLock;

use gosafe_common::api::location::{PermissionResponse, PositionResponse};
use gosafe_common::types::{Coordinate, PermissionStatus};

/// Simulated device: the permission answer and the current fix.
#[derive(Clone, Debug, PartialEq)]
struct DeviceState {
    permission: PermissionStatus,
    fix: Option<Coordinate>,
}

impl DeviceState {
    /// Build from raw env values. Anything other than "denied" grants access;
    /// a fix needs both coordinates and must be in range.
    fn from_env_values(permission: Option<&str>, lat: Option<&str>, lon: Option<&str>) -> Self {
        let permission = match permission {
            Some("denied") => PermissionStatus::Denied,
            _ => PermissionStatus::Granted,
        };

        let fix = match (
            lat.and_then(|s| s.parse::<f64>().ok()),
            lon.and_then(|s| s.parse::<f64>().ok()),
        ) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)).filter(Coordinate::is_valid),
            _ => None,
        };

        Self { permission, fix }
    }
}

/// Shared application state.
struct AppState {
    device: RwLock<DeviceState>,
    metrics_handle: PrometheusHandle,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("GoSafe Geo bridge starting");

    let metrics_handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus metrics recorder");
            std::process::exit(1);
        }
    };

    let permission = std::env::var("GEO_PERMISSION").ok();
    let lat = std::env::var("GEO_FIX_LAT").ok();
    let lon = std::env::var("GEO_FIX_LON").ok();
    let device = DeviceState::from_env_values(
        permission.as_deref(),
        lat.as_deref(),
        lon.as_deref(),
    );

    tracing::info!(
        permission = device.permission.as_str(),
        has_fix = device.fix.is_some(),
        "Device state initialized"
    );

    let state = Arc::new(AppState {
        device: RwLock::new(device),
        metrics_handle,
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/permission", get(get_permission).put(put_permission))
        .route("/position", get(get_position).put(put_position))
        .with_state(state);

    let port: u16 = std::env::var("GEO_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8082);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port = port, "Failed to bind TCP listener");
            std::process::exit(1);
        }
    };

    tracing::info!(port = port, "GoSafe Geo bridge listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "HTTP server error");
        std::process::exit(1);
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}

async fn get_permission(State(state): State<Arc<AppState>>) -> Json<PermissionResponse> {
    let status = state.device.read().await.permission;
    metrics::counter!("geo.permission.queries", "status" => status.as_str()).increment(1);
    Json(PermissionResponse { status })
}

async fn put_permission(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PermissionResponse>,
) -> StatusCode {
    state.device.write().await.permission = request.status;
    tracing::info!(permission = request.status.as_str(), "Permission changed");
    StatusCode::NO_CONTENT
}

/// 403 while permission is denied, 503 while there is no fix.
async fn get_position(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PositionResponse>, (StatusCode, String)> {
    let device = state.device.read().await.clone();
    position_response(&device).map(Json)
}

fn position_response(device: &DeviceState) -> Result<PositionResponse, (StatusCode, String)> {
    if !device.permission.is_granted() {
        return Err((StatusCode::FORBIDDEN, "location permission denied".into()));
    }

    let fix = device
        .fix
        .ok_or_else(|| (StatusCode::SERVICE_UNAVAILABLE, "no fix available".into()))?;

    Ok(PositionResponse {
        latitude: fix.latitude,
        longitude: fix.longitude,
        accuracy_m: None,
    })
}

async fn put_position(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PositionResponse>,
) -> Result<StatusCode, (StatusCode, String)> {
    let fix = Coordinate::new(request.latitude, request.longitude);
    if !fix.is_valid() {
        return Err((StatusCode::BAD_REQUEST, format!("invalid fix {}", fix)));
    }

    state.device.write().await.fix = Some(fix);
    tracing::info!(fix = %fix, "Position updated");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_defaults_grant_without_fix() {
        let device = DeviceState::from_env_values(None, None, None);
        assert_eq!(device.permission, PermissionStatus::Granted);
        assert_eq!(device.fix, None);
    }

    #[test]
    fn test_env_parses_fix_and_denial() {
        let device = DeviceState::from_env_values(Some("denied"), Some("43.8806"), Some("12.9956"));
        assert_eq!(device.permission, PermissionStatus::Denied);
        assert_eq!(device.fix, Some(Coordinate::new(43.8806, 12.9956)));

        let bad = DeviceState::from_env_values(None, Some("123.0"), Some("12.0"));
        assert_eq!(bad.fix, None);
    }

    #[test]
    fn test_position_response_codes() {
        let denied = DeviceState {
            permission: PermissionStatus::Denied,
            fix: Some(Coordinate::new(1.0, 2.0)),
        };
        assert_eq!(position_response(&denied).unwrap_err().0, StatusCode::FORBIDDEN);

        let no_fix = DeviceState {
            permission: PermissionStatus::Granted,
            fix: None,
        };
        assert_eq!(
            position_response(&no_fix).unwrap_err().0,
            StatusCode::SERVICE_UNAVAILABLE
        );

        let ok = DeviceState {
            permission: PermissionStatus::Granted,
            fix: Some(Coordinate::new(1.0, 2.0)),
        };
        let body = position_response(&ok).unwrap();
        assert_eq!((body.latitude, body.longitude), (1.0, 2.0));
    }
}
