use serde::{Deserialize, Serialize};

use crate::types::{Coordinate, EdgePadding, PermissionStatus, Region};

/// Top-level session engine configuration, deserialized from engine.toml.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemConfig {
    pub map: MapConfig,
    pub routing: RoutingConfig,
    pub location: LocationConfig,
}

/// Camera defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapConfig {
    /// Centre shown at startup when no location fix is available.
    pub initial_center: Coordinate,
    /// Latitude and longitude span of the startup region.
    pub initial_delta: f64,
    /// Padding used when fitting a route into view.
    #[serde(default)]
    pub fit_padding: EdgePadding,
}

impl MapConfig {
    pub fn initial_region(&self) -> Region {
        Region {
            center: self.initial_center,
            latitude_delta: self.initial_delta,
            longitude_delta: self.initial_delta,
        }
    }
}

/// External routing service parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Base URL of an OSRM-compatible service (e.g. "https://router.project-osrm.org").
    pub base_url: String,
    /// Routing profile ("driving").
    pub profile: String,
    /// Upper bound for one route fetch, retries included.
    pub timeout_seconds: u64,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Retry configuration for transport failures.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

/// Circuit breaker thresholds for the routing service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the breaker opens.
    pub failure_threshold: u32,
    /// Seconds the breaker stays open before allowing a probe.
    pub cooldown_seconds: u64,
}

/// Which location provider backs the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationProviderKind {
    /// Fixed permission and position from this file.
    Static,
    /// Device bridge reached over HTTP.
    Http,
}

/// Location provider configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocationConfig {
    pub provider: LocationProviderKind,
    /// Device bridge base URL. Required when `provider = "http"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout for the device bridge.
    #[serde(default = "default_location_timeout")]
    pub timeout_seconds: u64,
    /// Permission answered by the static provider.
    #[serde(default = "default_permission")]
    pub permission: PermissionStatus,
    /// Fix returned by the static provider. None means no fix is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_fix: Option<Coordinate>,
}

fn default_location_timeout() -> u64 {
    5
}

fn default_permission() -> PermissionStatus {
    PermissionStatus::Granted
}
