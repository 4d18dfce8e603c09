use std::sync::{Arc, Mutex, PoisonError};

use model::geometry::GeoPoint;

/// Handle to something drawn on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerRef(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Truck,
    Warning,
    Location,
    /// A vertex of a route being captured.
    Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    pub dash: Option<&'static str>,
}

impl PathStyle {
    /// Stored routes.
    pub const ROUTE: PathStyle = PathStyle {
        color: "#3b82f6",
        weight: 5.0,
        opacity: 0.8,
        dash: Some("10, 8"),
    };

    /// A route being captured.
    pub const DRAFT: PathStyle = PathStyle {
        color: "#10b981",
        weight: 4.0,
        opacity: 0.9,
        dash: None,
    };

    /// Shapes loaded from a backend.
    pub const GEOJSON: PathStyle = PathStyle {
        color: "#ff6600",
        weight: 3.0,
        opacity: 0.9,
        dash: None,
    };
}

/// Axis aligned box around a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl Bounds {
    pub fn of<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        points.into_iter().fold(None, |bounds, p| {
            Some(match bounds {
                None => Bounds {
                    south_west: *p,
                    north_east: *p,
                },
                Some(Bounds {
                    south_west,
                    north_east,
                }) => Bounds {
                    south_west: GeoPoint::new(
                        south_west.longitude.min(p.longitude),
                        south_west.latitude.min(p.latitude),
                    ),
                    north_east: GeoPoint::new(
                        north_east.longitude.max(p.longitude),
                        north_east.latitude.max(p.latitude),
                    ),
                },
            })
        })
    }
}

/// The map library, seen from the tracking logic. All operations are plain
/// commands; nothing depends on the map reacting in a particular way.
pub trait MapAdapter: Send {
    fn draw_path(&mut self, points: &[GeoPoint], style: &PathStyle) -> LayerRef;

    fn extend_path(&mut self, layer: LayerRef, point: GeoPoint);

    fn place_marker(&mut self, point: GeoPoint, icon: IconKind) -> LayerRef;

    fn move_marker(&mut self, layer: LayerRef, point: GeoPoint, heading: f64);

    fn remove_layer(&mut self, layer: LayerRef);

    fn fit_to_bounds(&mut self, bounds: Bounds);
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    DrawPath {
        layer: LayerRef,
        points: Vec<GeoPoint>,
        style: PathStyle,
    },
    ExtendPath {
        layer: LayerRef,
        point: GeoPoint,
    },
    PlaceMarker {
        layer: LayerRef,
        point: GeoPoint,
        icon: IconKind,
    },
    MoveMarker {
        layer: LayerRef,
        point: GeoPoint,
        heading: f64,
    },
    RemoveLayer(LayerRef),
    FitToBounds(Bounds),
}

#[derive(Debug, Default)]
struct Recording {
    next_layer: u64,
    live: Vec<LayerRef>,
    commands: Vec<MapCommand>,
}

/// A map that only records what it is told. Clones share the recording, so a
/// handle can be kept while the map itself is handed to a view.
#[derive(Debug, Clone, Default)]
pub struct RecordingMap {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Recording) -> R) -> R {
        let mut recording = self.recording.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *recording)
    }

    pub fn commands(&self) -> Vec<MapCommand> {
        self.with(|r| r.commands.clone())
    }

    /// Removes and returns everything recorded so far.
    pub fn take_commands(&self) -> Vec<MapCommand> {
        self.with(|r| std::mem::take(&mut r.commands))
    }

    /// Layers drawn and not removed yet.
    pub fn live_layers(&self) -> Vec<LayerRef> {
        self.with(|r| r.live.clone())
    }

    fn add_layer(&self, command: impl FnOnce(LayerRef) -> MapCommand) -> LayerRef {
        self.with(|r| {
            r.next_layer += 1;
            let layer = LayerRef(r.next_layer);
            r.live.push(layer);
            r.commands.push(command(layer));
            layer
        })
    }

    fn record(&self, command: MapCommand) {
        self.with(|r| r.commands.push(command))
    }
}

impl MapAdapter for RecordingMap {
    fn draw_path(&mut self, points: &[GeoPoint], style: &PathStyle) -> LayerRef {
        self.add_layer(|layer| MapCommand::DrawPath {
            layer,
            points: points.to_vec(),
            style: style.clone(),
        })
    }

    fn extend_path(&mut self, layer: LayerRef, point: GeoPoint) {
        self.record(MapCommand::ExtendPath { layer, point })
    }

    fn place_marker(&mut self, point: GeoPoint, icon: IconKind) -> LayerRef {
        self.add_layer(|layer| MapCommand::PlaceMarker { layer, point, icon })
    }

    fn move_marker(&mut self, layer: LayerRef, point: GeoPoint, heading: f64) {
        self.record(MapCommand::MoveMarker {
            layer,
            point,
            heading,
        })
    }

    fn remove_layer(&mut self, layer: LayerRef) {
        self.with(|r| {
            r.live.retain(|live| *live != layer);
            r.commands.push(MapCommand::RemoveLayer(layer));
        })
    }

    fn fit_to_bounds(&mut self, bounds: Bounds) {
        self.record(MapCommand::FitToBounds(bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_all_points() {
        let points = [
            GeoPoint::new(-77.03, 3.88),
            GeoPoint::new(-77.01, 3.86),
            GeoPoint::new(-77.05, 3.90),
        ];
        let bounds = Bounds::of(&points).unwrap();
        assert_eq!(bounds.south_west, GeoPoint::new(-77.05, 3.86));
        assert_eq!(bounds.north_east, GeoPoint::new(-77.01, 3.90));
    }

    #[test]
    fn no_points_no_bounds() {
        assert_eq!(Bounds::of(&[] as &[GeoPoint]), None);
    }

    #[test]
    fn recording_tracks_live_layers() {
        let mut map = RecordingMap::new();
        let handle = map.clone();
        let path = map.draw_path(&[GeoPoint::new(0.0, 0.0)], &PathStyle::DRAFT);
        let marker = map.place_marker(GeoPoint::new(0.0, 0.0), IconKind::Truck);
        assert_ne!(path, marker);
        assert_eq!(handle.live_layers(), vec![path, marker]);

        map.remove_layer(path);
        assert_eq!(handle.live_layers(), vec![marker]);
        assert_eq!(handle.take_commands().len(), 3);
        assert!(handle.commands().is_empty());
    }
}
