use serde::Serialize;

use gosafe_common::types::{
    CameraCommand, CameraInstruction, Coordinate, EdgePadding, Region, Report, ReportCategory,
};
use gosafe_common::GoSafeError;

use super::composer::ReportComposer;
use crate::routing::RouteError;

/// Destination, route polyline and fetch flag.
///
/// `route_path` is non-empty only while `destination` is set and the latest
/// fetch succeeded. `is_fetching_route` is true only while that fetch is
/// outstanding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavigationState {
    pub destination: Option<Coordinate>,
    pub route_path: Vec<Coordinate>,
    pub is_fetching_route: bool,
    pub last_error: Option<RouteError>,
}

impl NavigationState {
    fn reset(&mut self) {
        self.destination = None;
        self.route_path.clear();
        self.is_fetching_route = false;
        self.last_error = None;
    }
}

/// Focal state of the session, derived from selection and navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPhase {
    Idle,
    PointSelected,
    /// Destination pinned without a route (no user location to route from).
    DestinationPinned,
    RouteFetching,
    RouteReady,
    RouteFailed,
}

/// A route fetch the caller must perform and hand back via
/// [`MapSession::apply_route_result`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteRequest {
    pub generation: u64,
    pub origin: Coordinate,
    pub destination: Coordinate,
}

/// What happened to a destination search.
#[derive(Clone, Debug, PartialEq)]
pub enum RouteOutcome {
    /// Route applied; camera fit to its points.
    Ready { points: usize },
    /// Fetch failed; navigation is in RouteFailed and a notice was queued.
    Failed(RouteError),
    /// A newer request superseded this one; the result was discarded.
    Stale,
    /// No user location: camera recentred on the destination, nothing fetched.
    NoOrigin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    Selected,
    /// A report form is open; the tap was dropped.
    Ignored,
}

/// One-shot user-facing message.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    RouteNotFound,
    RouteUnavailable { message: String },
    SelectPointFirst,
}

/// Single owner of all mutable session data.
///
/// Every method is synchronous; I/O happens outside between
/// [`set_destination`](Self::set_destination) and
/// [`apply_route_result`](Self::apply_route_result).
#[derive(Debug)]
pub struct MapSession {
    user_location: Option<Coordinate>,
    selection: Option<Coordinate>,
    navigation: NavigationState,
    reports: Vec<Report>,
    composer: ReportComposer,
    /// Bumped whenever navigation changes; results carrying an older value are stale.
    route_generation: u64,
    camera: Option<CameraInstruction>,
    camera_seq: u64,
    notices: Vec<Notice>,
    fit_padding: EdgePadding,
}

impl MapSession {
    pub fn new(fit_padding: EdgePadding) -> Self {
        Self {
            user_location: None,
            selection: None,
            navigation: NavigationState::default(),
            reports: Vec::new(),
            composer: ReportComposer::new(),
            route_generation: 0,
            camera: None,
            camera_seq: 0,
            notices: Vec::new(),
            fit_padding,
        }
    }

    pub fn user_location(&self) -> Option<Coordinate> {
        self.user_location
    }

    pub fn selection(&self) -> Option<Coordinate> {
        self.selection
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn composer_anchor(&self) -> Option<Coordinate> {
        self.composer.anchor()
    }

    pub fn camera(&self) -> Option<&CameraInstruction> {
        self.camera.as_ref()
    }

    pub fn route_generation(&self) -> u64 {
        self.route_generation
    }

    pub fn phase(&self) -> NavigationPhase {
        let nav = &self.navigation;
        if nav.destination.is_some() {
            if nav.is_fetching_route {
                NavigationPhase::RouteFetching
            } else if !nav.route_path.is_empty() {
                NavigationPhase::RouteReady
            } else if nav.last_error.is_some() {
                NavigationPhase::RouteFailed
            } else {
                NavigationPhase::DestinationPinned
            }
        } else if self.selection.is_some() {
            NavigationPhase::PointSelected
        } else {
            NavigationPhase::Idle
        }
    }

    fn issue_camera(&mut self, command: CameraCommand) {
        self.camera_seq += 1;
        self.camera = Some(CameraInstruction {
            seq: self.camera_seq,
            command,
        });
    }

    /// Drop navigation and invalidate any in-flight fetch.
    fn reset_navigation(&mut self) {
        self.navigation.reset();
        self.route_generation += 1;
    }

    /// Show a fixed region (startup without a fix).
    pub fn show_region(&mut self, region: Region) {
        self.issue_camera(CameraCommand::ShowRegion { region });
    }

    /// Record a fresh fix and animate the camera to it.
    pub fn update_user_location(&mut self, location: Coordinate) {
        self.user_location = Some(location);
        self.issue_camera(CameraCommand::CenterOn {
            coordinate: location,
            animated: true,
        });
    }

    /// Map tapped: last tap wins, any route or destination is dropped.
    /// Ignored while a report form is open.
    pub fn tap(&mut self, at: Coordinate) -> TapOutcome {
        if self.composer.is_open() {
            tracing::debug!(at = %at, "Tap ignored while report form is open");
            return TapOutcome::Ignored;
        }

        if self.navigation.destination.is_some() {
            self.reset_navigation();
        }
        self.selection = Some(at);
        TapOutcome::Selected
    }

    /// Destination chosen: clears the selection (and any open form anchored to it).
    ///
    /// Returns the fetch to perform when a user location is known; otherwise
    /// the camera recentres on the destination and nothing is fetched.
    pub fn set_destination(&mut self, destination: Coordinate) -> Option<RouteRequest> {
        self.selection = None;
        if self.composer.cancel().is_some() {
            tracing::debug!("Report form closed by destination search");
        }

        self.reset_navigation();
        self.navigation.destination = Some(destination);

        match self.user_location {
            Some(origin) => {
                self.navigation.is_fetching_route = true;
                Some(RouteRequest {
                    generation: self.route_generation,
                    origin,
                    destination,
                })
            }
            None => {
                self.issue_camera(CameraCommand::CenterOn {
                    coordinate: destination,
                    animated: true,
                });
                None
            }
        }
    }

    /// Apply the result of `request`, unless a newer request superseded it.
    pub fn apply_route_result(
        &mut self,
        request: &RouteRequest,
        result: Result<Vec<Coordinate>, RouteError>,
    ) -> RouteOutcome {
        if request.generation != self.route_generation {
            let stale = GoSafeError::StaleRouteResult {
                generation: request.generation,
                current: self.route_generation,
            };
            tracing::debug!(reason = %stale, "Discarding route result");
            return RouteOutcome::Stale;
        }

        self.navigation.is_fetching_route = false;

        match result {
            Ok(path) if !path.is_empty() => {
                let points = path.len();
                self.navigation.route_path = path.clone();
                self.navigation.last_error = None;
                self.issue_camera(CameraCommand::FitToPath {
                    path,
                    padding: self.fit_padding,
                });
                RouteOutcome::Ready { points }
            }
            Ok(_) => self.fail_route(RouteError::NotFound),
            Err(e) => self.fail_route(e),
        }
    }

    /// The caller stopped waiting for `request`. If it is still the latest
    /// fetch, clear the fetching flag and invalidate it; the destination stays
    /// pinned without a route.
    pub fn abandon_route(&mut self, request: &RouteRequest) -> bool {
        if request.generation != self.route_generation || !self.navigation.is_fetching_route {
            return false;
        }
        self.navigation.is_fetching_route = false;
        self.route_generation += 1;
        true
    }

    fn fail_route(&mut self, error: RouteError) -> RouteOutcome {
        self.navigation.route_path.clear();
        self.navigation.last_error = Some(error.clone());
        self.notices.push(match &error {
            RouteError::NotFound => Notice::RouteNotFound,
            RouteError::Network(message) => Notice::RouteUnavailable {
                message: message.clone(),
            },
        });
        RouteOutcome::Failed(error)
    }

    /// Drop destination and route. No-op (returns false) without a destination.
    pub fn clear_navigation(&mut self) -> bool {
        if self.navigation.destination.is_none() {
            return false;
        }

        self.reset_navigation();
        if let Some(location) = self.user_location {
            self.issue_camera(CameraCommand::CenterOn {
                coordinate: location,
                animated: true,
            });
        }
        true
    }

    /// Open the report form at the current selection.
    ///
    /// Without a selection, queues a "select a point first" prompt and fails.
    pub fn open_composer(&mut self) -> Result<Coordinate, GoSafeError> {
        let Some(selection) = self.selection else {
            self.notices.push(Notice::SelectPointFirst);
            return Err(GoSafeError::NoActiveSelection);
        };

        self.composer.open(selection);
        Ok(selection)
    }

    /// Submit the open form: appends the report and clears the selection.
    pub fn submit_report(
        &mut self,
        category: ReportCategory,
        note: Option<String>,
    ) -> Result<Report, GoSafeError> {
        if self.selection.is_none() {
            self.composer.cancel();
        }

        let report = match self.composer.submit(category, note) {
            Ok(report) => report,
            Err(e) => {
                self.notices.push(Notice::SelectPointFirst);
                return Err(e);
            }
        };

        self.reports.push(report.clone());
        self.selection = None;
        Ok(report)
    }

    /// Close the form without touching selection or reports.
    pub fn cancel_composer(&mut self) -> bool {
        self.composer.cancel().is_some()
    }

    /// Drain pending one-shot notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
