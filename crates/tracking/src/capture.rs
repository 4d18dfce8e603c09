use model::{
    geometry::{GeoPoint, RouteShape},
    route::NewRoute,
};

use crate::error::CaptureError;

/// Records clicked map points into a new route.
///
/// Points are only accepted between a successful [`CaptureSession::start`] and
/// the next [`CaptureSession::cancel`]. Order of insertion is the order of the
/// resulting path.
#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    active: bool,
    name: String,
    points: Vec<GeoPoint>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a new capture. On failure the session is left untouched.
    pub fn start(&mut self, draft_name: &str) -> Result<(), CaptureError> {
        let name = draft_name.trim();
        if name.is_empty() {
            return Err(CaptureError::InvalidName);
        }
        self.name = name.to_owned();
        self.points.clear();
        self.active = true;
        log::debug!("capturing route '{}'", self.name);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Appends a point. Returns `false` and ignores the point while inactive.
    pub fn add_point(&mut self, point: GeoPoint) -> bool {
        if !self.active {
            return false;
        }
        self.points.push(point);
        true
    }

    /// Swaps the whole sequence, e.g. after the user edited the drawn line.
    pub fn replace_points(&mut self, points: Vec<GeoPoint>) -> bool {
        if !self.active {
            return false;
        }
        self.points = points;
        true
    }

    pub fn build_shape(&self) -> Result<RouteShape, CaptureError> {
        if self.points.len() < 2 {
            return Err(CaptureError::InsufficientPoints {
                found: self.points.len(),
            });
        }
        Ok(RouteShape::LineString(self.points.clone()))
    }

    /// The request body for storing the captured route.
    pub fn draft(&self, owner_id: &str) -> Result<NewRoute, CaptureError> {
        if self.name.is_empty() {
            return Err(CaptureError::InvalidName);
        }
        Ok(NewRoute {
            name: self.name.clone(),
            owner_id: owner_id.to_owned(),
            shape: self.build_shape()?,
        })
    }

    /// Deactivates and discards everything. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.active = false;
        self.name.clear();
        self.points.clear();
    }

    pub fn clear(&mut self) {
        self.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lng: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lng, lat)
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut session = CaptureSession::new();
        assert_eq!(session.start("  "), Err(CaptureError::InvalidName));
        assert!(!session.is_active());
    }

    #[test]
    fn names_are_trimmed() {
        let mut session = CaptureSession::new();
        session.start("  Ruta Norte ").unwrap();
        assert_eq!(session.name(), "Ruta Norte");
    }

    #[test]
    fn points_before_start_are_ignored() {
        let mut session = CaptureSession::new();
        assert!(!session.add_point(p(1.0, 1.0)));
        session.start("Ruta Norte").unwrap();
        assert!(session.points().is_empty());
    }

    #[test]
    fn shape_needs_two_points() {
        let mut session = CaptureSession::new();
        session.start("Ruta Norte").unwrap();
        assert_eq!(
            session.build_shape(),
            Err(CaptureError::InsufficientPoints { found: 0 })
        );
        session.add_point(p(0.0, 0.0));
        assert_eq!(
            session.build_shape(),
            Err(CaptureError::InsufficientPoints { found: 1 })
        );
        session.add_point(p(0.0, 1.0));
        session.add_point(p(1.0, 1.0));
        assert_eq!(
            session.build_shape().unwrap(),
            RouteShape::LineString(vec![p(0.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)])
        );
    }

    #[test]
    fn restart_discards_previous_points() {
        let mut session = CaptureSession::new();
        session.start("a").unwrap();
        session.add_point(p(0.0, 0.0));
        session.start("b").unwrap();
        assert!(session.points().is_empty());
    }

    #[test]
    fn failed_restart_keeps_the_capture() {
        let mut session = CaptureSession::new();
        session.start("a").unwrap();
        session.add_point(p(0.0, 0.0));
        assert!(session.start(" ").is_err());
        assert!(session.is_active());
        assert_eq!(session.points().len(), 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut session = CaptureSession::new();
        session.start("a").unwrap();
        session.add_point(p(0.0, 0.0));
        session.cancel();
        session.cancel();
        assert!(!session.is_active());
        assert!(session.points().is_empty());
        assert!(!session.add_point(p(1.0, 1.0)));
    }

    #[test]
    fn edits_replace_the_sequence() {
        let mut session = CaptureSession::new();
        assert!(!session.replace_points(vec![p(0.0, 0.0)]));
        session.start("a").unwrap();
        session.add_point(p(5.0, 5.0));
        assert!(session.replace_points(vec![p(0.0, 0.0), p(1.0, 0.0)]));
        assert_eq!(session.points(), &[p(0.0, 0.0), p(1.0, 0.0)]);
    }

    #[test]
    fn draft_carries_name_owner_and_shape() {
        let mut session = CaptureSession::new();
        session.start("Ruta Norte").unwrap();
        session.add_point(p(-77.03, 3.88));
        session.add_point(p(-77.02, 3.89));
        let draft = session.draft("p1").unwrap();
        assert_eq!(draft.name, "Ruta Norte");
        assert_eq!(draft.owner_id, "p1");
        assert_eq!(draft.shape.point_count(), 2);
    }
}
