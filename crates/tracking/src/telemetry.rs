use std::sync::{Arc, Mutex, PoisonError};

use model::{geometry::GeoPoint, position::PositionReport, route::Route};
use tokio::runtime::Handle;
use utility::id::Id;

use crate::backend::RouteBackend;

/// Receives the simulated positions of a playback.
///
/// Reporting is fire-and-forget: implementations must return immediately and
/// deal with failures themselves.
pub trait PositionReporter: Send + Sync {
    fn report(&self, run_id: Id<Route>, position: GeoPoint);
}

/// Sends positions to the backend on a spawned task. Failures are logged and
/// dropped.
#[derive(Clone)]
pub struct BackendReporter {
    backend: Arc<dyn RouteBackend>,
    owner_id: String,
}

impl BackendReporter {
    pub fn new<S: Into<String>>(backend: Arc<dyn RouteBackend>, owner_id: S) -> Self {
        Self {
            backend,
            owner_id: owner_id.into(),
        }
    }
}

impl PositionReporter for BackendReporter {
    fn report(&self, run_id: Id<Route>, position: GeoPoint) {
        let Ok(runtime) = Handle::try_current() else {
            log::warn!("no runtime to report position of run {} on", run_id);
            return;
        };
        let backend = self.backend.clone();
        let report = PositionReport::new(position, self.owner_id.as_str());
        runtime.spawn(async move {
            match backend.report_position(run_id, &report).await {
                Ok(()) => log::debug!("reported {:?} for run {}", position, run_id),
                Err(why) => log::warn!("position report for run {} failed: {}", run_id, why),
            }
        });
    }
}

/// Keeps every report in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<(Id<Route>, GeoPoint)>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(Id<Route>, GeoPoint)> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PositionReporter for RecordingReporter {
    fn report(&self, run_id: Id<Route>, position: GeoPoint) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((run_id, position));
    }
}

/// Drops every report, for playback without a backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReporter;

impl PositionReporter for NoReporter {
    fn report(&self, run_id: Id<Route>, _position: GeoPoint) {
        log::trace!("not reporting position of run {}", run_id);
    }
}
