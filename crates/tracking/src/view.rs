use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use model::{geometry::GeoPoint, route::Route, WithId};
use tokio::{sync::watch, time::Instant};
use utility::id::Id;

use crate::{
    backend::RouteBackend,
    capture::CaptureSession,
    error::{PlaybackError, ViewError},
    map::{Bounds, IconKind, LayerRef, MapAdapter, PathStyle},
    playback::{PlaybackConfig, PlaybackEngine, PlaybackMode, StopReason, TickOutcome},
    session::SessionContext,
    telemetry::{BackendReporter, PositionReporter},
    ticker::Ticker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Running,
    Paused,
    Finished(StopReason),
}

/// Everything a tick touches.
struct Stage<M> {
    map: M,
    engine: PlaybackEngine,
    actor: Option<LayerRef>,
    run: Option<Id<Route>>,
    /// Bumped by every start and stop. A tick of an older playback ends
    /// without touching the stage.
    generation: u64,
}

/// Runs a [`PlaybackEngine`] on a [`Ticker`], moving the vehicle marker on the
/// map and handing due positions to a [`PositionReporter`].
///
/// Engine, map and marker share one lock with the tick callback. Once
/// [`PlaybackDriver::stop`] returns, no further map command or report is made
/// for the stopped playback.
pub struct PlaybackDriver<M: MapAdapter + 'static> {
    stage: Arc<Mutex<Stage<M>>>,
    ticker: Option<Ticker>,
    status: Arc<watch::Sender<PlaybackStatus>>,
    reporter: Arc<dyn PositionReporter>,
    frame_interval: Duration,
}

fn lock<M>(stage: &Mutex<Stage<M>>) -> MutexGuard<'_, Stage<M>> {
    stage.lock().unwrap_or_else(PoisonError::into_inner)
}

fn advance<M: MapAdapter>(
    stage: &Mutex<Stage<M>>,
    status: &watch::Sender<PlaybackStatus>,
    reporter: &dyn PositionReporter,
    generation: u64,
    now: Instant,
) -> ControlFlow<()> {
    let mut stage = lock(stage);
    let Stage {
        map,
        engine,
        actor,
        run,
        generation: current,
    } = &mut *stage;
    if *current != generation {
        return ControlFlow::Break(());
    }

    match engine.tick(now) {
        TickOutcome::Idle if engine.mode() == PlaybackMode::Paused => ControlFlow::Continue(()),
        TickOutcome::Idle => ControlFlow::Break(()),
        TickOutcome::Moved(frame) => {
            if let Some(layer) = *actor {
                map.move_marker(layer, frame.position, frame.heading);
            }
            match *run {
                Some(run_id) if frame.report_due => reporter.report(run_id, frame.position),
                _ => {}
            }
            ControlFlow::Continue(())
        }
        TickOutcome::Finished(reason) => {
            if let Some(layer) = actor.take() {
                map.remove_layer(layer);
            }
            if let Some(run) = run.take() {
                log::info!("playback of route {} finished", run);
            }
            status.send_replace(PlaybackStatus::Finished(reason));
            ControlFlow::Break(())
        }
    }
}

impl<M: MapAdapter + 'static> PlaybackDriver<M> {
    pub fn new(map: M, reporter: Arc<dyn PositionReporter>, config: &PlaybackConfig) -> Self {
        let (status, _) = watch::channel(PlaybackStatus::Idle);
        Self {
            stage: Arc::new(Mutex::new(Stage {
                map,
                engine: PlaybackEngine::new(config),
                actor: None,
                run: None,
                generation: 0,
            })),
            ticker: None,
            status: Arc::new(status),
            reporter,
            frame_interval: config.frame_interval,
        }
    }

    /// Plays `path` from its first point, ending any current playback.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        &mut self,
        run_id: Id<Route>,
        path: &[GeoPoint],
    ) -> Result<watch::Receiver<PlaybackStatus>, PlaybackError> {
        if path.len() < 2 {
            return Err(PlaybackError::InsufficientPoints { found: path.len() });
        }
        self.stop();
        let generation = {
            let mut stage = lock(&self.stage);
            let first = stage.engine.start(path, Instant::now())?;
            let actor = stage.map.place_marker(first, IconKind::Truck);
            stage.actor = Some(actor);
            stage.run = Some(run_id);
            stage.generation += 1;
            stage.generation
        };
        self.status.send_replace(PlaybackStatus::Running);
        log::info!("playing route {} ({} points)", run_id, path.len());

        let stage = self.stage.clone();
        let status = self.status.clone();
        let reporter = self.reporter.clone();
        self.ticker = Some(Ticker::start(self.frame_interval, move |now| {
            advance(&stage, &status, reporter.as_ref(), generation, now)
        }));
        Ok(self.status.subscribe())
    }

    pub fn pause(&mut self) -> bool {
        let paused = lock(&self.stage).engine.pause();
        if paused {
            self.status.send_replace(PlaybackStatus::Paused);
        }
        paused
    }

    pub fn resume(&mut self) -> bool {
        let resumed = lock(&self.stage).engine.resume();
        if resumed {
            self.status.send_replace(PlaybackStatus::Running);
        }
        resumed
    }

    /// Ends the playback and removes the vehicle. Returns whether one was
    /// running or paused.
    pub fn stop(&mut self) -> bool {
        let stopped = {
            let mut stage = lock(&self.stage);
            stage.generation += 1;
            let stopped = stage.engine.stop();
            if let Some(layer) = stage.actor.take() {
                stage.map.remove_layer(layer);
            }
            stage.run = None;
            stopped
        };
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
        if stopped {
            self.status
                .send_replace(PlaybackStatus::Finished(StopReason::Stopped));
        }
        stopped
    }

    pub fn status(&self) -> PlaybackStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.subscribe()
    }

    pub fn position(&self) -> Option<GeoPoint> {
        lock(&self.stage).engine.position()
    }

    pub fn run(&self) -> Option<Id<Route>> {
        lock(&self.stage).run
    }

    pub fn with_map<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        let mut stage = lock(&self.stage);
        f(&mut stage.map)
    }
}

/// A route shown on the map.
#[derive(Debug, Clone)]
struct ShownRoute {
    route: WithId<Route>,
    layer: Option<LayerRef>,
}

#[derive(Debug, Default)]
struct DraftLayers {
    path: Option<LayerRef>,
    points: Vec<LayerRef>,
}

/// The route screen: owns one capture session and one playback, and every map
/// layer either of them creates.
///
/// Dropping the view tears it down.
pub struct RouteView<M: MapAdapter + 'static> {
    session: SessionContext,
    backend: Arc<dyn RouteBackend>,
    capture: CaptureSession,
    draft: DraftLayers,
    routes: Vec<ShownRoute>,
    driver: PlaybackDriver<M>,
}

impl<M: MapAdapter + 'static> RouteView<M> {
    /// A view reporting positions to `backend` under the session's profile.
    pub fn new(
        map: M,
        session: SessionContext,
        backend: Arc<dyn RouteBackend>,
        config: &PlaybackConfig,
    ) -> Self {
        let reporter = Arc::new(BackendReporter::new(backend.clone(), session.owner_id()));
        Self::with_reporter(map, session, backend, config, reporter)
    }

    pub fn with_reporter(
        map: M,
        session: SessionContext,
        backend: Arc<dyn RouteBackend>,
        config: &PlaybackConfig,
        reporter: Arc<dyn PositionReporter>,
    ) -> Self {
        Self {
            session,
            backend,
            capture: CaptureSession::new(),
            draft: DraftLayers::default(),
            routes: Vec::new(),
            driver: PlaybackDriver::new(map, reporter, config),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn capture(&self) -> &CaptureSession {
        &self.capture
    }

    pub fn start_capture(&mut self, draft_name: &str) -> Result<(), ViewError> {
        self.capture.start(draft_name)?;
        self.clear_draft();
        Ok(())
    }

    /// A click on the map. Returns whether the point became part of the
    /// captured route.
    pub fn on_click(&mut self, point: GeoPoint) -> bool {
        if !self.capture.add_point(point) {
            return false;
        }
        let draft = &mut self.draft;
        self.driver.with_map(|map| {
            draft.points.push(map.place_marker(point, IconKind::Point));
            match draft.path {
                Some(layer) => map.extend_path(layer, point),
                None => draft.path = Some(map.draw_path(&[point], &PathStyle::DRAFT)),
            }
        });
        true
    }

    pub fn cancel_capture(&mut self) {
        self.capture.cancel();
        self.clear_draft();
    }

    fn clear_draft(&mut self) {
        let draft = std::mem::take(&mut self.draft);
        self.driver.with_map(|map| {
            draft
                .path
                .into_iter()
                .chain(draft.points)
                .for_each(|layer| map.remove_layer(layer));
        });
    }

    /// Stores the captured route and shows it. The capture is kept when the
    /// backend refuses it.
    pub async fn save_capture(&mut self) -> Result<WithId<Route>, ViewError> {
        let draft = self.capture.draft(self.session.owner_id())?;
        let created = self.backend.create_route(&draft).await?;
        log::info!(
            "saved route {} '{}' with {} points",
            created.id,
            created.content.name,
            created.content.shape.point_count()
        );
        self.cancel_capture();
        self.show_route(created.clone(), &PathStyle::ROUTE);
        Ok(created)
    }

    /// Replaces the shown routes with the profile's routes from the backend
    /// and zooms to them. Returns how many were loaded.
    pub async fn load_routes(&mut self) -> Result<usize, ViewError> {
        let routes = self.backend.list_routes(self.session.owner_id()).await?;
        self.clear_routes();
        for route in routes {
            self.show_route(route, &PathStyle::GEOJSON);
        }
        let points: Vec<GeoPoint> = self
            .routes
            .iter()
            .flat_map(|shown| shown.route.content.shape.points())
            .collect();
        if let Some(bounds) = Bounds::of(&points) {
            self.driver.with_map(|map| map.fit_to_bounds(bounds));
        }
        Ok(self.routes.len())
    }

    fn show_route(&mut self, route: WithId<Route>, style: &PathStyle) {
        let points = route.content.shape.points();
        let layer = if points.is_empty() {
            log::warn!("route {} has no drawable shape", route.id);
            None
        } else {
            Some(self.driver.with_map(|map| map.draw_path(&points, style)))
        };
        self.routes.retain(|shown| shown.route.id != route.id);
        self.routes.push(ShownRoute { route, layer });
    }

    fn clear_routes(&mut self) {
        let routes = std::mem::take(&mut self.routes);
        self.driver.with_map(|map| {
            routes
                .into_iter()
                .filter_map(|shown| shown.layer)
                .for_each(|layer| map.remove_layer(layer));
        });
    }

    pub fn routes(&self) -> impl Iterator<Item = &WithId<Route>> {
        self.routes.iter().map(|shown| &shown.route)
    }

    pub fn route(&self, route_id: Id<Route>) -> Option<&WithId<Route>> {
        self.routes().find(|route| route.id == route_id)
    }

    /// Replays a shown route. The receiver reports when it completes or is
    /// stopped.
    pub fn play(
        &mut self,
        route_id: Id<Route>,
    ) -> Result<watch::Receiver<PlaybackStatus>, ViewError> {
        let path = self
            .route(route_id)
            .ok_or(ViewError::UnknownRoute(route_id))?
            .content
            .shape
            .points();
        Ok(self.driver.start(route_id, &path)?)
    }

    pub fn pause(&mut self) -> bool {
        self.driver.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.driver.resume()
    }

    pub fn stop_playback(&mut self) -> bool {
        self.driver.stop()
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        self.driver.status()
    }

    pub fn vehicle_position(&self) -> Option<GeoPoint> {
        self.driver.position()
    }

    /// Stops the playback and removes every layer of the view. Safe to call
    /// repeatedly.
    pub fn teardown(&mut self) {
        self.driver.stop();
        self.cancel_capture();
        self.clear_routes();
    }
}

impl<M: MapAdapter + 'static> Drop for RouteView<M> {
    fn drop(&mut self) {
        self.teardown();
    }
}
