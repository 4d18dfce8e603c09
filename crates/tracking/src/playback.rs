use std::time::Duration;

use model::geometry::GeoPoint;
use tokio::time::Instant;

use crate::error::PlaybackError;

/// Tunables of a playback.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// Progress added per tick, as a fraction of one segment.
    pub step: f64,
    pub report_interval: Duration,
    pub frame_interval: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step: 0.005,
            report_interval: Duration::from_secs(2),
            frame_interval: Duration::from_millis(16),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Idle,
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The end of the path was reached.
    Completed,
    /// `stop` was called.
    Stopped,
}

/// Where the simulated vehicle is after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub position: GeoPoint,
    /// Degrees, 0° north and 90° east. For rotating the vehicle icon only.
    pub heading: f64,
    pub segment: usize,
    pub progress: f64,
    /// Whether this position should be sent to the reporting collaborator.
    pub report_due: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Nothing moved: the engine is not running.
    Idle,
    Moved(Frame),
    Finished(StopReason),
}

/// Replays a path as a point moving along it, one tick at a time.
///
/// The engine itself never looks at a clock. Callers pass the time of every
/// tick, which decides when positions are due for reporting.
#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    step: f64,
    report_interval: Duration,
    path: Vec<GeoPoint>,
    segment: usize,
    progress: f64,
    mode: PlaybackMode,
    next_report: Option<Instant>,
    last_stop: Option<StopReason>,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

impl PlaybackEngine {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            step: config.step,
            report_interval: config.report_interval,
            path: Vec::new(),
            segment: 0,
            progress: 0.0,
            mode: PlaybackMode::Idle,
            next_report: None,
            last_stop: None,
        }
    }

    /// Starts over on `path`, from any mode. Returns the first point, where the
    /// vehicle is placed.
    pub fn start(
        &mut self,
        path: &[GeoPoint],
        now: Instant,
    ) -> Result<GeoPoint, PlaybackError> {
        if path.len() < 2 {
            return Err(PlaybackError::InsufficientPoints { found: path.len() });
        }
        self.path = path.to_vec();
        self.segment = 0;
        self.progress = 0.0;
        self.mode = PlaybackMode::Running;
        self.next_report = Some(now + self.report_interval);
        self.last_stop = None;
        Ok(self.path[0])
    }

    /// Only has an effect while running.
    pub fn pause(&mut self) -> bool {
        if self.mode != PlaybackMode::Running {
            return false;
        }
        self.mode = PlaybackMode::Paused;
        true
    }

    /// Only has an effect while paused.
    pub fn resume(&mut self) -> bool {
        if self.mode != PlaybackMode::Paused {
            return false;
        }
        self.mode = PlaybackMode::Running;
        true
    }

    /// Ends a running or paused playback. Returns whether anything changed.
    pub fn stop(&mut self) -> bool {
        match self.mode {
            PlaybackMode::Running | PlaybackMode::Paused => {
                self.finish(StopReason::Stopped);
                true
            }
            PlaybackMode::Idle | PlaybackMode::Stopped => false,
        }
    }

    /// Forgets the path and returns to idle.
    pub fn reset(&mut self) {
        self.path.clear();
        self.segment = 0;
        self.progress = 0.0;
        self.mode = PlaybackMode::Idle;
        self.next_report = None;
        self.last_stop = None;
    }

    fn finish(&mut self, reason: StopReason) {
        self.mode = PlaybackMode::Stopped;
        self.progress = 0.0;
        self.next_report = None;
        self.last_stop = Some(reason);
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.mode != PlaybackMode::Running {
            return TickOutcome::Idle;
        }
        self.progress += self.step;
        if self.progress >= 1.0 {
            self.progress = 0.0;
            self.segment += 1;
            if self.segment >= self.path.len() - 1 {
                self.finish(StopReason::Completed);
                return TickOutcome::Finished(StopReason::Completed);
            }
        }

        let report_due = match self.next_report {
            Some(due) if now >= due => {
                self.next_report = Some(now + self.report_interval);
                true
            }
            _ => false,
        };
        let (from, to) = self.segment_ends();
        TickOutcome::Moved(Frame {
            position: from.lerp(&to, self.progress),
            heading: from.heading_to(&to),
            segment: self.segment,
            progress: self.progress,
            report_due,
        })
    }

    fn segment_ends(&self) -> (GeoPoint, GeoPoint) {
        (self.path[self.segment], self.path[self.segment + 1])
    }

    /// The interpolated position, while a playback is running or paused.
    pub fn position(&self) -> Option<GeoPoint> {
        if !self.is_active() {
            return None;
        }
        let (from, to) = self.segment_ends();
        Some(from.lerp(&to, self.progress))
    }

    pub fn heading(&self) -> Option<f64> {
        if !self.is_active() {
            return None;
        }
        let (from, to) = self.segment_ends();
        Some(from.heading_to(&to))
    }

    pub fn is_active(&self) -> bool {
        matches!(self.mode, PlaybackMode::Running | PlaybackMode::Paused)
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn segment(&self) -> usize {
        self.segment
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn path(&self) -> &[GeoPoint] {
        &self.path
    }

    /// Why the last playback ended, until the next start or reset.
    pub fn last_stop(&self) -> Option<StopReason> {
        self.last_stop
    }
}
