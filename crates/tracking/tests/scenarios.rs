use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Local;
use model::{
    geometry::{normalize_str, GeoPoint, RouteShape},
    position::PositionReport,
    route::{NewRoute, Route},
    user::User,
    WithId,
};
use tokio::time;
use tracking::{
    backend::{BackendError, RouteBackend},
    capture::CaptureSession,
    error::{CaptureError, ViewError},
    map::{MapCommand, RecordingMap},
    playback::{PlaybackConfig, PlaybackEngine, StopReason, TickOutcome},
    session::SessionContext,
    telemetry::RecordingReporter,
    view::{PlaybackStatus, RouteView},
};
use utility::id::Id;

fn p(lng: f64, lat: f64) -> GeoPoint {
    GeoPoint::new(lng, lat)
}

/// Serves and stores routes in memory. Positions go to a `RecordingReporter`.
#[derive(Default)]
struct FakeBackend {
    routes: Mutex<Vec<WithId<Route>>>,
}

impl FakeBackend {
    fn with_route(points: Vec<GeoPoint>) -> Self {
        let backend = Self::default();
        backend.routes.lock().unwrap().push(WithId::new(
            Id::new(1),
            Route {
                name: "Ruta Norte".to_owned(),
                owner_id: "p1".to_owned(),
                shape: RouteShape::LineString(points),
                created_at: Local::now(),
            },
        ));
        backend
    }
}

#[async_trait]
impl RouteBackend for FakeBackend {
    async fn login(&self, _: &str, _: &str) -> Result<WithId<User>, BackendError> {
        unimplemented!()
    }

    async fn list_routes(&self, owner_id: &str) -> Result<Vec<WithId<Route>>, BackendError> {
        let routes = self.routes.lock().unwrap();
        Ok(routes
            .iter()
            .filter(|route| route.content.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create_route(&self, route: &NewRoute) -> Result<WithId<Route>, BackendError> {
        let mut routes = self.routes.lock().unwrap();
        let created = WithId::new(
            Id::new(routes.len() as i32 + 1),
            Route {
                name: route.name.clone(),
                owner_id: route.owner_id.clone(),
                shape: route.shape.clone(),
                created_at: Local::now(),
            },
        );
        routes.push(created.clone());
        Ok(created)
    }

    async fn report_position(&self, _: Id<Route>, _: &PositionReport) -> Result<(), BackendError> {
        Ok(())
    }
}

fn view(
    backend: Arc<FakeBackend>,
    step: f64,
) -> (RouteView<RecordingMap>, RecordingMap, RecordingReporter) {
    let map = RecordingMap::new();
    let reporter = RecordingReporter::new();
    let config = PlaybackConfig {
        step,
        ..PlaybackConfig::default()
    };
    let view = RouteView::with_reporter(
        map.clone(),
        SessionContext::anonymous("p1"),
        backend,
        &config,
        Arc::new(reporter.clone()),
    );
    (view, map, reporter)
}

#[tokio::test]
async fn two_point_path_completes_after_two_ticks() {
    let mut engine = PlaybackEngine::new(&PlaybackConfig {
        step: 0.5,
        ..PlaybackConfig::default()
    });
    let now = time::Instant::now();
    assert_eq!(engine.start(&[p(0.0, 0.0), p(0.0, 10.0)], now), Ok(p(0.0, 0.0)));

    assert!(matches!(engine.tick(now), TickOutcome::Moved(frame) if frame.position == p(0.0, 5.0)));
    assert_eq!(
        engine.tick(now),
        TickOutcome::Finished(StopReason::Completed)
    );
    assert_eq!(engine.segment(), 1);
    assert_eq!(engine.position(), None);
}

#[test]
fn multi_path_is_flattened_in_order() {
    let shape = normalize_str(
        r#"{"type":"MultiLineString","coordinates":[[[0,0],[1,1]],[[2,2],[3,3]]]}"#,
    );
    assert_eq!(
        shape,
        RouteShape::LineString(vec![p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0), p(3.0, 3.0)])
    );
}

#[test]
fn capture_needs_a_name_first() {
    let mut session = CaptureSession::new();
    assert_eq!(session.start("  "), Err(CaptureError::InvalidName));
    assert!(!session.add_point(p(1.0, 1.0)));
    session.start("Ruta Norte").unwrap();
    assert!(session.points().is_empty());
    assert_eq!(session.name(), "Ruta Norte");
}

#[tokio::test(start_paused = true)]
async fn captured_routes_are_saved_and_drawn() {
    let backend = Arc::new(FakeBackend::default());
    let (mut view, map, _) = view(backend.clone(), 0.005);

    assert!(!view.on_click(p(0.0, 0.0)));
    view.start_capture("Ruta Sur").unwrap();
    assert!(view.on_click(p(-77.03, 3.88)));
    assert!(matches!(
        view.save_capture().await,
        Err(ViewError::Capture(CaptureError::InsufficientPoints { found: 1 }))
    ));
    assert!(view.on_click(p(-77.02, 3.89)));
    assert!(view.on_click(p(-77.01, 3.90)));
    // three point markers and one growing draft path
    assert_eq!(map.live_layers().len(), 4);

    let saved = view.save_capture().await.unwrap();
    assert_eq!(saved.content.owner_id, "p1");
    assert_eq!(saved.content.shape.point_count(), 3);
    assert!(!view.capture().is_active());
    // only the stored route is left
    assert_eq!(map.live_layers().len(), 1);
    assert_eq!(backend.routes.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn playback_reports_every_two_seconds_while_running() {
    let backend = Arc::new(FakeBackend::with_route(vec![p(0.0, 0.0), p(0.0, 10.0)]));
    let (mut view, map, reporter) = view(backend, 0.0001);

    assert_eq!(view.load_routes().await.unwrap(), 1);
    assert!(map
        .commands()
        .iter()
        .any(|command| matches!(command, MapCommand::FitToBounds(_))));

    view.play(Id::new(1)).unwrap();
    time::sleep(Duration::from_millis(6100)).await;
    assert_eq!(reporter.reports().len(), 3);
    assert!(reporter.reports().iter().all(|(run, _)| *run == Id::new(1)));

    assert!(view.pause());
    time::sleep(Duration::from_secs(10)).await;
    assert_eq!(reporter.reports().len(), 3);

    assert!(view.resume());
    time::sleep(Duration::from_millis(100)).await;
    assert_eq!(reporter.reports().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn no_updates_after_stop() {
    let backend = Arc::new(FakeBackend::with_route(vec![p(0.0, 0.0), p(0.0, 10.0)]));
    let (mut view, map, reporter) = view(backend, 0.0001);
    view.load_routes().await.unwrap();

    let status = view.play(Id::new(1)).unwrap();
    time::sleep(Duration::from_millis(2500)).await;
    assert!(view.stop_playback());
    assert_eq!(
        *status.borrow(),
        PlaybackStatus::Finished(StopReason::Stopped)
    );

    let commands = map.commands().len();
    let reports = reporter.reports().len();
    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(map.commands().len(), commands);
    assert_eq!(reporter.reports().len(), reports);
    assert_eq!(view.vehicle_position(), None);
}

#[tokio::test(start_paused = true)]
async fn playback_completes_and_signals() {
    let backend = Arc::new(FakeBackend::with_route(vec![
        p(0.0, 0.0),
        p(1.0, 0.0),
        p(1.0, 1.0),
    ]));
    let (mut view, map, _) = view(backend, 0.25);
    view.load_routes().await.unwrap();

    let mut status = view.play(Id::new(1)).unwrap();
    status.changed().await.unwrap();
    assert_eq!(
        *status.borrow(),
        PlaybackStatus::Finished(StopReason::Completed)
    );
    // the vehicle is gone, the route stays
    assert_eq!(map.live_layers().len(), 1);
    assert_eq!(view.playback_status(), PlaybackStatus::Finished(StopReason::Completed));
}

#[tokio::test(start_paused = true)]
async fn unknown_routes_are_not_played() {
    let backend = Arc::new(FakeBackend::default());
    let (mut view, _, _) = view(backend, 0.005);
    assert!(matches!(
        view.play(Id::new(9)),
        Err(ViewError::UnknownRoute(id)) if id == Id::new(9)
    ));
}

#[tokio::test(start_paused = true)]
async fn teardown_removes_every_layer() {
    let backend = Arc::new(FakeBackend::with_route(vec![p(0.0, 0.0), p(0.0, 10.0)]));
    let (mut view, map, reporter) = view(backend, 0.001);
    view.load_routes().await.unwrap();
    view.play(Id::new(1)).unwrap();
    view.start_capture("Ruta Este").unwrap();
    view.on_click(p(1.0, 1.0));
    view.on_click(p(2.0, 2.0));
    time::sleep(Duration::from_millis(100)).await;
    assert!(!map.live_layers().is_empty());

    drop(view);
    assert!(map.live_layers().is_empty());

    let commands = map.commands().len();
    let reports = reporter.reports().len();
    time::sleep(Duration::from_secs(5)).await;
    assert_eq!(map.commands().len(), commands);
    assert_eq!(reporter.reports().len(), reports);
}
