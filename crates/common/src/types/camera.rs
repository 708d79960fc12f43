use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Visible map area: a centre plus the latitude/longitude span shown.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

/// Screen-edge padding (in points) applied when fitting a path into view.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgePadding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl EdgePadding {
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl Default for EdgePadding {
    fn default() -> Self {
        Self::uniform(50.0)
    }
}

/// Instruction for the render surface's camera.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraCommand {
    /// Show a fixed region (startup without a location fix).
    ShowRegion { region: Region },
    /// Move the camera centre to a coordinate.
    CenterOn {
        coordinate: Coordinate,
        animated: bool,
    },
    /// Fit every point of a path into view with fixed edge padding.
    FitToPath {
        path: Vec<Coordinate>,
        padding: EdgePadding,
    },
}

/// A camera command stamped with the sequence number it was issued under.
///
/// Render surfaces compare `seq` against the last one they applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraInstruction {
    pub seq: u64,
    pub command: CameraCommand,
}
