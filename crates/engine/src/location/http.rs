use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use gosafe_common::api::location::{PermissionResponse, PositionResponse};
use gosafe_common::types::{Coordinate, PermissionStatus};

use super::{LocationError, LocationProvider};

/// Location provider backed by the device bridge HTTP service.
pub struct HttpLocationProvider {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpLocationProvider {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn fetch_permission(&self) -> Result<PermissionStatus, LocationError> {
        let response = self
            .http
            .get(format!("{}/permission", self.base_url))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "permission query returned {}",
                response.status()
            )));
        }

        let body: PermissionResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(format!("bad permission body: {}", e)))?;

        Ok(body.status)
    }

    async fn fetch_position(&self) -> Result<Coordinate, LocationError> {
        let start = std::time::Instant::now();

        let response = self
            .http
            .get(format!("{}/position", self.base_url))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        let status = response.status();
        metrics::histogram!("location.fix.latency").record(start.elapsed().as_secs_f64());

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(LocationError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(LocationError::Unavailable(format!(
                "position query returned {}",
                status
            )));
        }

        let body: PositionResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(format!("bad position body: {}", e)))?;

        position_to_coordinate(&body)
    }
}

/// Convert a device fix, rejecting out-of-range values. Accuracy is ignored.
fn position_to_coordinate(body: &PositionResponse) -> Result<Coordinate, LocationError> {
    let coordinate = Coordinate::new(body.latitude, body.longitude);
    if !coordinate.is_valid() {
        return Err(LocationError::Unavailable(format!(
            "device reported invalid fix {}",
            coordinate
        )));
    }
    Ok(coordinate)
}

impl LocationProvider for HttpLocationProvider {
    fn request_access(&self) -> Pin<Box<dyn Future<Output = PermissionStatus> + Send + '_>> {
        Box::pin(async move {
            match self.fetch_permission().await {
                Ok(status) => status,
                Err(e) => {
                    // An unreachable bridge cannot grant access.
                    tracing::warn!(error = %e, "Permission query failed, treating as denied");
                    PermissionStatus::Denied
                }
            }
        })
    }

    fn current_location(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Coordinate, LocationError>> + Send + '_>> {
        Box::pin(self.fetch_position())
    }
}
