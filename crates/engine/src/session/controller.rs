use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use gosafe_common::types::{Coordinate, EdgePadding, Region, Report, ReportCategory};
use gosafe_common::GoSafeError;

use super::snapshot::MapSnapshot;
use super::state::{MapSession, Notice, RouteOutcome, RouteRequest, TapOutcome};
use crate::location::{self, LocationError, LocationProvider};
use crate::routing::{RouteError, RouteFetcher};

/// Drives a [`MapSession`] from user intents and the two I/O adapters.
///
/// The session lock is never held across an await: each intent mutates under
/// the lock, releases it for I/O, then re-locks to apply the result. A fresh
/// snapshot is published before the lock is released, so subscribers never
/// see a half-applied update.
pub struct SessionController {
    session: Mutex<MapSession>,
    locator: Arc<dyn LocationProvider>,
    router: Arc<dyn RouteFetcher>,
    route_timeout: Duration,
    initial_region: Region,
    snapshots: watch::Sender<MapSnapshot>,
}

impl SessionController {
    pub fn new(
        locator: Arc<dyn LocationProvider>,
        router: Arc<dyn RouteFetcher>,
        route_timeout: Duration,
        initial_region: Region,
        fit_padding: EdgePadding,
    ) -> Self {
        let session = MapSession::new(fit_padding);
        let (snapshots, _) = watch::channel(session.snapshot());

        Self {
            session: Mutex::new(session),
            locator,
            router,
            route_timeout,
            initial_region,
            snapshots,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MapSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the session and publish the result.
    fn mutate<T>(&self, f: impl FnOnce(&mut MapSession) -> T) -> T {
        let mut session = self.lock();
        let out = f(&mut session);
        self.snapshots.send_replace(session.snapshot());
        out
    }

    /// Receive a snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<MapSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> MapSnapshot {
        self.lock().snapshot()
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        self.lock().take_notices()
    }

    /// Initial centring: on the user when a fix is available, else on the
    /// configured region.
    pub async fn start(&self) {
        match self.acquire_location().await {
            Ok(fix) => {
                tracing::info!(location = %fix, "Session started at user location");
                self.mutate(|s| s.update_user_location(fix));
            }
            Err(e) => {
                tracing::info!(
                    reason = %e,
                    center = %self.initial_region.center,
                    "Session started without user location"
                );
                let region = self.initial_region;
                self.mutate(|s| s.show_region(region));
            }
        }
    }

    async fn acquire_location(&self) -> Result<Coordinate, LocationError> {
        let result = location::acquire(self.locator.as_ref()).await;
        if let Err(e) = &result {
            metrics::counter!("location.fix.failures").increment(1);
            match e {
                LocationError::PermissionDenied => {
                    tracing::warn!("Location permission denied, continuing without user location")
                }
                LocationError::Unavailable(reason) => {
                    tracing::warn!(reason = %reason, "Location unavailable")
                }
            }
        }
        result
    }

    /// "Recenter on me": re-acquire and animate. A failure keeps the last
    /// known location and leaves the camera where it is.
    pub async fn recenter(&self) -> Result<Coordinate, GoSafeError> {
        let fix = self.acquire_location().await?;
        self.mutate(|s| s.update_user_location(fix));
        Ok(fix)
    }

    pub fn tap(&self, at: Coordinate) -> TapOutcome {
        self.mutate(|s| s.tap(at))
    }

    /// Destination chosen: route from the user location when known.
    ///
    /// Concurrent searches are allowed; only the latest one's result is applied.
    /// Dropping the future before it completes abandons the fetch and leaves
    /// the destination pinned without a route.
    pub async fn search_destination(&self, destination: Coordinate) -> RouteOutcome {
        let Some(request) = self.mutate(|s| s.set_destination(destination)) else {
            tracing::info!(destination = %destination, "No user location, recentred without routing");
            return RouteOutcome::NoOrigin;
        };

        tracing::info!(
            generation = request.generation,
            origin = %request.origin,
            destination = %request.destination,
            "Route fetch issued"
        );
        metrics::counter!("route.fetch.requests").increment(1);

        let mut pending = PendingRoute {
            controller: self,
            request,
            settled: false,
        };

        let fetch = self.router.fetch_route(request.origin, request.destination);
        let result = match tokio::time::timeout(self.route_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(RouteError::Network(format!(
                "route fetch timed out after {}s",
                self.route_timeout.as_secs_f64()
            ))),
        };

        let outcome = self.mutate(|s| s.apply_route_result(&request, result));
        pending.settled = true;
        match &outcome {
            RouteOutcome::Ready { points } => {
                tracing::info!(generation = request.generation, points, "Route ready")
            }
            RouteOutcome::Failed(e) => {
                tracing::warn!(generation = request.generation, error = %e, "Route fetch failed")
            }
            RouteOutcome::Stale => {
                metrics::counter!("route.fetch.stale").increment(1);
                tracing::debug!(generation = request.generation, "Stale route result dropped")
            }
            RouteOutcome::NoOrigin => {}
        }
        outcome
    }

    pub fn clear_navigation(&self) -> bool {
        self.mutate(|s| s.clear_navigation())
    }

    pub fn open_report_composer(&self) -> Result<Coordinate, GoSafeError> {
        self.mutate(|s| s.open_composer())
    }

    pub fn submit_report(
        &self,
        category: ReportCategory,
        note: Option<String>,
    ) -> Result<Report, GoSafeError> {
        let report = self.mutate(|s| s.submit_report(category, note))?;

        tracing::info!(
            report_id = %report.id,
            category = %report.category,
            coordinate = %report.coordinate,
            "Report created"
        );
        metrics::counter!("reports.created", "category" => report.category.as_str()).increment(1);

        Ok(report)
    }

    pub fn cancel_report(&self) -> bool {
        self.mutate(|s| s.cancel_composer())
    }
}

/// Settles an issued route request when the search future is dropped
/// before its result is applied.
struct PendingRoute<'a> {
    controller: &'a SessionController,
    request: RouteRequest,
    settled: bool,
}

impl Drop for PendingRoute<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let request = self.request;
        if self.controller.mutate(|s| s.abandon_route(&request)) {
            metrics::counter!("route.fetch.abandoned").increment(1);
            tracing::info!(
                generation = request.generation,
                destination = %request.destination,
                "Route search dropped before its result arrived"
            );
        }
    }
}
