use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use gosafe_common::api::session::{ComposeResponse, ErrorResponse, SubmitReportRequest};
use gosafe_common::types::{CategoryStyle, Coordinate, Report, ReportCategory};
use gosafe_common::GoSafeError;

use crate::session::{MapSnapshot, Notice, RouteOutcome, SessionController};

/// Shared application state accessible from axum handlers.
pub struct AppState {
    pub controller: Arc<SessionController>,
    pub metrics_handle: PrometheusHandle,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Build the session HTTP surface.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/map/snapshot", get(snapshot_handler))
        .route("/map/notices", get(notices_handler))
        .route("/map/tap", post(tap_handler))
        .route("/map/destination", post(destination_handler))
        .route("/map/navigation/clear", post(clear_navigation_handler))
        .route("/map/recenter", post(recenter_handler))
        .route("/reports/compose", post(compose_handler))
        .route("/reports/submit", post(submit_handler))
        .route("/reports/cancel", post(cancel_handler))
        .route("/reports/categories", get(categories_handler))
        .with_state(state)
}

/// Map an engine error to an HTTP status.
pub fn status_for(error: &GoSafeError) -> StatusCode {
    match error {
        GoSafeError::NoActiveSelection => StatusCode::CONFLICT,
        GoSafeError::Validation(_) => StatusCode::BAD_REQUEST,
        GoSafeError::PermissionDenied | GoSafeError::LocationUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        GoSafeError::RouteNotFound => StatusCode::NOT_FOUND,
        GoSafeError::Network(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(error: GoSafeError) -> ApiError {
    (
        status_for(&error),
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn validate_coordinate(c: Coordinate) -> Result<Coordinate, ApiError> {
    if c.is_valid() {
        Ok(c)
    } else {
        Err(api_error(GoSafeError::Validation(format!(
            "coordinate out of range: {}",
            c
        ))))
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}

async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Json<MapSnapshot> {
    Json(state.controller.snapshot())
}

/// Drains: each notice is returned exactly once.
async fn notices_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Notice>> {
    Json(state.controller.take_notices())
}

async fn tap_handler(
    State(state): State<Arc<AppState>>,
    Json(at): Json<Coordinate>,
) -> Result<Json<MapSnapshot>, ApiError> {
    let at = validate_coordinate(at)?;
    state.controller.tap(at);
    Ok(Json(state.controller.snapshot()))
}

/// Waits for the route fetch. A failed route is still a 200: the snapshot
/// carries the RouteFailed phase and the notice queue carries the alert.
async fn destination_handler(
    State(state): State<Arc<AppState>>,
    Json(destination): Json<Coordinate>,
) -> Result<Json<MapSnapshot>, ApiError> {
    let destination = validate_coordinate(destination)?;
    if let RouteOutcome::Stale = state.controller.search_destination(destination).await {
        tracing::debug!(destination = %destination, "Destination superseded by a newer search");
    }
    Ok(Json(state.controller.snapshot()))
}

async fn clear_navigation_handler(State(state): State<Arc<AppState>>) -> Json<MapSnapshot> {
    state.controller.clear_navigation();
    Json(state.controller.snapshot())
}

async fn recenter_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MapSnapshot>, ApiError> {
    state.controller.recenter().await.map_err(api_error)?;
    Ok(Json(state.controller.snapshot()))
}

async fn compose_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ComposeResponse>, ApiError> {
    let anchor = state
        .controller
        .open_report_composer()
        .map_err(api_error)?;
    Ok(Json(ComposeResponse { anchor }))
}

async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitReportRequest>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let report = state
        .controller
        .submit_report(request.category, request.note)
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn cancel_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.controller.cancel_report() {
        StatusCode::OK
    } else {
        StatusCode::NO_CONTENT
    }
}

#[derive(Serialize)]
struct CategoryEntry {
    category: ReportCategory,
    #[serde(flatten)]
    style: CategoryStyle,
}

async fn categories_handler() -> Json<Vec<CategoryEntry>> {
    Json(
        ReportCategory::ALL
            .iter()
            .map(|c| CategoryEntry {
                category: *c,
                style: *c.style(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&GoSafeError::NoActiveSelection), StatusCode::CONFLICT);
        assert_eq!(status_for(&GoSafeError::RouteNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&GoSafeError::Network("down".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&GoSafeError::PermissionDenied),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_invalid_coordinate_rejected() {
        let (status, body) = validate_coordinate(Coordinate::new(95.0, 0.0)).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.0.error.contains("out of range"));
        assert!(validate_coordinate(Coordinate::new(43.88, 12.99)).is_ok());
    }

    #[test]
    fn test_select_point_first_message() {
        let (status, body) = api_error(GoSafeError::NoActiveSelection);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.0.error, "Select a point on the map first");
    }
}
