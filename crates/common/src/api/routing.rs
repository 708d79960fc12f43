use serde::{Deserialize, Serialize};

/// GET /route/v1/{profile}/{coordinates} response from an OSRM-compatible service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteServiceResponse {
    /// "Ok" on success, otherwise an error code such as "NoRoute".
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Candidate routes, best first.
    #[serde(default)]
    pub routes: Vec<RouteCandidate>,
}

/// A single candidate route.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub geometry: RouteGeometry,
    /// Metres.
    #[serde(default)]
    pub distance: f64,
    /// Seconds.
    #[serde(default)]
    pub duration: f64,
}

/// GeoJSON LineString geometry. Positions are `[longitude, latitude]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteGeometry {
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}
