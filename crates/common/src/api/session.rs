use serde::{Deserialize, Serialize};

use crate::types::{Coordinate, ReportCategory};

/// POST /reports/submit request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitReportRequest {
    pub category: ReportCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// POST /reports/compose response: the coordinate the form is anchored to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComposeResponse {
    pub anchor: Coordinate,
}

/// Error body returned by the session HTTP surface.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
