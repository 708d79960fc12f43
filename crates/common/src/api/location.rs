use serde::{Deserialize, Serialize};

use crate::types::PermissionStatus;

/// GET /permission response (and PUT /permission request) of the device bridge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PermissionResponse {
    pub status: PermissionStatus,
}

/// GET /position response (and PUT /position request) of the device bridge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PositionResponse {
    pub latitude: f64,
    pub longitude: f64,
    /// Device-reported accuracy radius. Not used by the session engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}
