//! End-to-end session scenarios driven through `SessionController` with
//! scripted location and routing adapters.
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use gosafe_common::api::routing::RouteServiceResponse;
use gosafe_common::types::{
    CameraCommand, Coordinate, EdgePadding, PermissionStatus, Region, ReportCategory,
};
use gosafe_common::GoSafeError;
use gosafe_engine::location::{LocationError, LocationProvider, StaticLocationProvider};
use gosafe_engine::routing::{decode_route, RouteError, RouteFetcher};
use gosafe_engine::session::{NavigationPhase, Notice, RouteOutcome, SessionController, TapOutcome};

const HOME: Coordinate = Coordinate::new(43.8806, 12.9956);
const DEST: Coordinate = Coordinate::new(43.89, 12.95);

type RouteResult = Result<Vec<Coordinate>, RouteError>;

/// Router that answers every call by decoding a canned service body.
struct ScriptedRouter {
    body: &'static str,
    calls: AtomicU32,
}

impl ScriptedRouter {
    fn new(body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            body,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RouteFetcher for ScriptedRouter {
    fn fetch_route(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
    ) -> Pin<Box<dyn Future<Output = RouteResult> + Send + '_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response: RouteServiceResponse = serde_json::from_str(self.body).unwrap();
        Box::pin(async move { decode_route(response) })
    }
}

/// Router whose calls resolve only when the test releases them, in call order.
struct GatedRouter {
    gates: Mutex<VecDeque<oneshot::Receiver<RouteResult>>>,
}

impl GatedRouter {
    fn new(count: usize) -> (Arc<Self>, Vec<oneshot::Sender<RouteResult>>) {
        let mut senders = Vec::new();
        let mut gates = VecDeque::new();
        for _ in 0..count {
            let (tx, rx) = oneshot::channel();
            senders.push(tx);
            gates.push_back(rx);
        }
        (
            Arc::new(Self {
                gates: Mutex::new(gates),
            }),
            senders,
        )
    }
}

impl RouteFetcher for GatedRouter {
    fn fetch_route(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
    ) -> Pin<Box<dyn Future<Output = RouteResult> + Send + '_>> {
        let gate = self.gates.lock().unwrap().pop_front();
        Box::pin(async move {
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(RouteError::Network("gate dropped".into()))),
                None => Err(RouteError::Network("no gate left".into())),
            }
        })
    }
}

/// Provider whose fix can be changed between calls.
struct MovableLocator {
    fix: Mutex<Option<Coordinate>>,
}

impl LocationProvider for MovableLocator {
    fn request_access(&self) -> Pin<Box<dyn Future<Output = PermissionStatus> + Send + '_>> {
        Box::pin(async { PermissionStatus::Granted })
    }

    fn current_location(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Coordinate, LocationError>> + Send + '_>> {
        let fix = *self.fix.lock().unwrap();
        Box::pin(async move { fix.ok_or_else(|| LocationError::Unavailable("no fix".into())) })
    }
}

fn region() -> Region {
    Region {
        center: HOME,
        latitude_delta: 0.01,
        longitude_delta: 0.01,
    }
}

fn controller(
    locator: Arc<dyn LocationProvider>,
    router: Arc<dyn RouteFetcher>,
) -> SessionController {
    SessionController::new(
        locator,
        router,
        Duration::from_secs(5),
        region(),
        EdgePadding::uniform(40.0),
    )
}

const TWO_POINT_ROUTE: &str = r#"{
    "code": "Ok",
    "routes": [{"geometry": {"type": "LineString", "coordinates": [[12.94, 43.88], [12.95, 43.89]]}}]
}"#;

const NO_ROUTES: &str = r#"{"code": "Ok", "routes": []}"#;

#[tokio::test]
async fn test_tap_compose_submit() {
    let session = controller(
        Arc::new(StaticLocationProvider::granted(HOME)),
        ScriptedRouter::new(TWO_POINT_ROUTE),
    );
    session.start().await;

    let tapped = Coordinate::new(43.8806, 12.9956);
    assert_eq!(session.tap(tapped), TapOutcome::Selected);
    assert_eq!(session.snapshot().selection, Some(tapped));

    assert_eq!(session.open_report_composer().unwrap(), tapped);
    assert_eq!(session.snapshot().composer_anchor, Some(tapped));

    let before = session.snapshot().reports.len();
    let report = session
        .submit_report(ReportCategory::Danger, Some("test".into()))
        .unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.reports.len(), before + 1);
    let marker = &snapshot.reports[before];
    assert_eq!(marker.report.id, report.id);
    assert_eq!(marker.report.category, ReportCategory::Danger);
    assert_eq!(marker.report.coordinate, tapped);
    assert_eq!(marker.report.note.as_deref(), Some("test"));
    assert_eq!(snapshot.selection, None);
}

#[tokio::test]
async fn test_submit_without_open_produces_nothing() {
    let session = controller(
        Arc::new(StaticLocationProvider::granted(HOME)),
        ScriptedRouter::new(TWO_POINT_ROUTE),
    );
    session.tap(DEST);

    let err = session
        .submit_report(ReportCategory::Weather, None)
        .unwrap_err();
    assert!(matches!(err, GoSafeError::NoActiveSelection));
    assert!(session.snapshot().reports.is_empty());
    assert_eq!(session.take_notices(), vec![Notice::SelectPointFirst]);
}

#[tokio::test]
async fn test_permission_denied_recenters_without_fetch() {
    let router = ScriptedRouter::new(TWO_POINT_ROUTE);
    let session = controller(Arc::new(StaticLocationProvider::denied()), router.clone());
    session.start().await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.user_location, None);
    assert!(matches!(
        snapshot.camera.map(|c| c.command),
        Some(CameraCommand::ShowRegion { .. })
    ));

    assert_eq!(session.search_destination(DEST).await, RouteOutcome::NoOrigin);
    assert_eq!(router.calls(), 0);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.destination, Some(DEST));
    assert_eq!(
        snapshot.camera.unwrap().command,
        CameraCommand::CenterOn {
            coordinate: DEST,
            animated: true
        }
    );
    assert!(matches!(
        session.recenter().await,
        Err(GoSafeError::PermissionDenied)
    ));
}

#[tokio::test]
async fn test_route_geometry_is_flipped() {
    let session = controller(
        Arc::new(StaticLocationProvider::granted(HOME)),
        ScriptedRouter::new(TWO_POINT_ROUTE),
    );
    session.start().await;

    assert_eq!(
        session.search_destination(DEST).await,
        RouteOutcome::Ready { points: 2 }
    );

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, NavigationPhase::RouteReady);
    assert_eq!(
        snapshot.route_path,
        vec![Coordinate::new(43.88, 12.94), Coordinate::new(43.89, 12.95)]
    );
    match snapshot.camera.unwrap().command {
        CameraCommand::FitToPath { path, padding } => {
            assert_eq!(path, snapshot.route_path);
            assert_eq!(padding, EdgePadding::uniform(40.0));
        }
        other => panic!("expected fit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_zero_routes_enters_route_failed() {
    let session = controller(
        Arc::new(StaticLocationProvider::granted(HOME)),
        ScriptedRouter::new(NO_ROUTES),
    );
    session.start().await;

    let outcome = session.search_destination(DEST).await;
    assert_eq!(outcome, RouteOutcome::Failed(RouteError::NotFound));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, NavigationPhase::RouteFailed);
    assert!(snapshot.route_path.is_empty());
    assert!(!snapshot.is_fetching_route);
    assert_eq!(session.take_notices(), vec![Notice::RouteNotFound]);
}

async fn race_two_searches(release_older_first: bool) {
    let (router, mut gates) = GatedRouter::new(2);
    let session = controller(Arc::new(StaticLocationProvider::granted(HOME)), router);
    session.start().await;

    let older_dest = Coordinate::new(43.87, 13.01);
    let older_path = vec![HOME, older_dest];
    let newer_path = vec![HOME, DEST];

    let newer_gate = gates.pop().unwrap();
    let older_gate = gates.pop().unwrap();

    let release = async {
        tokio::task::yield_now().await;
        if release_older_first {
            older_gate.send(Ok(older_path)).unwrap();
            tokio::task::yield_now().await;
            newer_gate.send(Ok(newer_path.clone())).unwrap();
        } else {
            newer_gate.send(Ok(newer_path.clone())).unwrap();
            tokio::task::yield_now().await;
            older_gate.send(Ok(older_path)).unwrap();
        }
    };

    let (older, newer, ()) = tokio::join!(
        session.search_destination(older_dest),
        session.search_destination(DEST),
        release
    );

    assert_eq!(older, RouteOutcome::Stale);
    assert_eq!(newer, RouteOutcome::Ready { points: 2 });

    let snapshot = session.snapshot();
    assert_eq!(snapshot.destination, Some(DEST));
    assert_eq!(snapshot.route_path, newer_path);
    assert!(!snapshot.is_fetching_route);
}

#[tokio::test]
async fn test_last_request_wins_older_resolves_first() {
    race_two_searches(true).await;
}

#[tokio::test]
async fn test_last_request_wins_older_resolves_last() {
    race_two_searches(false).await;
}

#[tokio::test]
async fn test_recenter_keeps_last_known_on_failure() {
    let locator = Arc::new(MovableLocator {
        fix: Mutex::new(None),
    });
    let session = controller(locator.clone(), ScriptedRouter::new(TWO_POINT_ROUTE));
    session.start().await;
    assert_eq!(session.snapshot().user_location, None);

    *locator.fix.lock().unwrap() = Some(HOME);
    assert_eq!(session.recenter().await.unwrap(), HOME);
    assert_eq!(session.snapshot().user_location, Some(HOME));

    *locator.fix.lock().unwrap() = None;
    assert!(matches!(
        session.recenter().await,
        Err(GoSafeError::LocationUnavailable(_))
    ));
    assert_eq!(session.snapshot().user_location, Some(HOME));
}

#[tokio::test]
async fn test_clear_navigation_returns_to_user() {
    let session = controller(
        Arc::new(StaticLocationProvider::granted(HOME)),
        ScriptedRouter::new(TWO_POINT_ROUTE),
    );
    session.start().await;
    session.search_destination(DEST).await;

    assert!(session.clear_navigation());
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, NavigationPhase::Idle);
    assert!(snapshot.route_path.is_empty());
    assert_eq!(
        snapshot.camera.unwrap().command,
        CameraCommand::CenterOn {
            coordinate: HOME,
            animated: true
        }
    );
    assert!(!session.clear_navigation());
}
