use serde::Serialize;

use gosafe_common::types::{CameraInstruction, CategoryStyle, Coordinate, Report};

use super::state::{MapSession, NavigationPhase};

/// A report pin with its category styling resolved.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportMarker {
    #[serde(flatten)]
    pub report: Report,
    pub style: CategoryStyle,
}

/// Everything the render surface needs for one redraw.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapSnapshot {
    pub user_location: Option<Coordinate>,
    pub selection: Option<Coordinate>,
    pub destination: Option<Coordinate>,
    pub route_path: Vec<Coordinate>,
    pub is_fetching_route: bool,
    pub phase: NavigationPhase,
    /// Coordinate the open report form is anchored to, if any.
    pub composer_anchor: Option<Coordinate>,
    pub reports: Vec<ReportMarker>,
    pub camera: Option<CameraInstruction>,
}

impl MapSession {
    pub fn snapshot(&self) -> MapSnapshot {
        let navigation = self.navigation();

        MapSnapshot {
            user_location: self.user_location(),
            selection: self.selection(),
            destination: navigation.destination,
            route_path: navigation.route_path.clone(),
            is_fetching_route: navigation.is_fetching_route,
            phase: self.phase(),
            composer_anchor: self.composer_anchor(),
            reports: self
                .reports()
                .iter()
                .map(|report| ReportMarker {
                    report: report.clone(),
                    style: *report.category.style(),
                })
                .collect(),
            camera: self.camera().cloned(),
        }
    }
}
