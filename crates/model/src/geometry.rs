//! Route geometry and the normalizer that turns whatever the backend sends
//! into a single ordered point sequence.
//!
//! Everything downstream of [`normalize`] works with [`RouteShape`]; this is
//! the only place that looks at untyped geometry payloads.

use std::fmt;

use itertools::Itertools;
use schemars::{
    gen::SchemaGenerator,
    schema::{ArrayValidation, InstanceType, Schema, SchemaObject},
    JsonSchema,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use utility::geo;

use crate::ExampleData;

/// A geographic position. Serialized as a GeoJSON position `[lng, lat]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Whether the point lies within the WGS84 coordinate ranges. Decoding does
    /// not enforce this.
    pub fn is_valid(&self) -> bool {
        geo::is_valid_coordinate(self.latitude, self.longitude)
    }

    /// Planar interpolation towards `other`, independently per coordinate.
    pub fn lerp(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            longitude: geo::lerp(self.longitude, other.longitude, t),
            latitude: geo::lerp(self.latitude, other.latitude, t),
        }
    }

    /// Heading in degrees from this point towards `other`.
    pub fn heading_to(&self, other: &GeoPoint) -> f64 {
        geo::planar_heading(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        geo::haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

impl Serialize for GeoPoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [self.longitude, self.latitude].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // GeoJSON positions may carry an altitude as third member.
        let position = Vec::<f64>::deserialize(deserializer)?;
        match position.as_slice() {
            [longitude, latitude, ..] => Ok(GeoPoint::new(*longitude, *latitude)),
            _ => Err(de::Error::invalid_length(
                position.len(),
                &"a position with at least two members",
            )),
        }
    }
}

impl JsonSchema for GeoPoint {
    fn schema_name() -> String {
        "GeoPoint".to_owned()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::Array.into()),
            format: Some("[longitude, latitude]".to_owned()),
            array: Some(Box::new(ArrayValidation {
                items: Some(gen.subschema_for::<f64>().into()),
                min_items: Some(2),
                ..Default::default()
            })),
            ..Default::default()
        }
        .into()
    }
}

/// GeoJSON-like line geometry of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "coordinates")]
pub enum RouteShape {
    LineString(Vec<GeoPoint>),
    MultiLineString(Vec<Vec<GeoPoint>>),
}

impl RouteShape {
    pub fn empty() -> Self {
        Self::LineString(vec![])
    }

    /// Every point in listed order. Multi-paths are concatenated.
    pub fn points(&self) -> Vec<GeoPoint> {
        match self {
            Self::LineString(points) => points.clone(),
            Self::MultiLineString(lines) => lines.concat(),
        }
    }

    /// The ordered points of a simple path, `None` for a multi-path.
    pub fn path(&self) -> Option<&[GeoPoint]> {
        match self {
            Self::LineString(points) => Some(points),
            Self::MultiLineString(_) => None,
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            Self::LineString(points) => points.len(),
            Self::MultiLineString(lines) => lines.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }

    /// Great-circle length of the drawn line. Segment boundaries of a
    /// multi-path are not bridged.
    pub fn length_km(&self) -> f64 {
        let line_length = |points: &[GeoPoint]| -> f64 {
            points
                .iter()
                .tuple_windows()
                .map(|(a, b)| a.distance_km(b))
                .sum()
        };
        match self {
            Self::LineString(points) => line_length(points.as_slice()),
            Self::MultiLineString(lines) => {
                lines.iter().map(|line| line_length(line.as_slice())).sum()
            }
        }
    }
}

impl Default for RouteShape {
    fn default() -> Self {
        Self::empty()
    }
}

impl ExampleData for RouteShape {
    fn example_data() -> Self {
        Self::LineString(vec![
            GeoPoint::new(-77.0318, 3.8801),
            GeoPoint::new(-77.0288, 3.8851),
            GeoPoint::new(-77.0268, 3.8901),
            GeoPoint::new(-77.0218, 3.8951),
        ])
    }
}

/// A geometry exactly as received: either serialized JSON text or an already
/// decoded JSON value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawShape {
    Text(String),
    Structured(Value),
}

impl From<Value> for RawShape {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Structured(other),
        }
    }
}

/// Why a geometry payload could not be understood. Only ever logged; the
/// normalizer degrades to an empty path instead.
#[derive(Debug)]
pub enum MalformedGeometry {
    Unparseable(serde_json::Error),
    UnknownKind(Option<String>),
    BadCoordinates(serde_json::Error),
}

impl std::error::Error for MalformedGeometry {}

impl fmt::Display for MalformedGeometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unparseable(why) => write!(f, "geometry is not valid json: {}", why),
            Self::UnknownKind(Some(kind)) => {
                write!(f, "unsupported geometry type '{}'", kind)
            }
            Self::UnknownKind(None) => write!(f, "geometry has no type"),
            Self::BadCoordinates(why) => {
                write!(f, "geometry coordinates are malformed: {}", why)
            }
        }
    }
}

/// Normalizes a raw geometry into a simple path. Never fails: anything
/// unrecognized becomes an empty path and a warning in the log.
pub fn normalize(raw: RawShape) -> RouteShape {
    match raw {
        RawShape::Text(text) => normalize_str(&text),
        RawShape::Structured(value) => normalize_value(&value),
    }
}

pub fn normalize_str(raw: &str) -> RouteShape {
    degrade(try_normalize_str(raw))
}

pub fn normalize_value(raw: &Value) -> RouteShape {
    degrade(try_normalize_value(raw))
}

fn degrade(result: Result<RouteShape, MalformedGeometry>) -> RouteShape {
    result.unwrap_or_else(|why| {
        log::warn!("discarding route geometry: {}", why);
        RouteShape::empty()
    })
}

pub fn try_normalize_str(raw: &str) -> Result<RouteShape, MalformedGeometry> {
    let value: Value =
        serde_json::from_str(raw).map_err(MalformedGeometry::Unparseable)?;
    try_normalize_value(&value)
}

/// Strict variant of [`normalize_value`].
///
/// - `LineString` coordinates are passed through in order.
/// - A `MultiLineString` with one line is unwrapped, several lines are
///   concatenated in listed order. The boundaries between lines are lost.
pub fn try_normalize_value(raw: &Value) -> Result<RouteShape, MalformedGeometry> {
    // double encoded payloads show up as a json string holding the geometry
    if let Value::String(text) = raw {
        return try_normalize_str(text);
    }

    let kind = raw.get("type").and_then(Value::as_str);
    let coordinates = raw.get("coordinates").cloned().unwrap_or(Value::Null);
    match kind {
        Some("LineString") => serde_json::from_value::<Vec<GeoPoint>>(coordinates)
            .map(RouteShape::LineString)
            .map_err(MalformedGeometry::BadCoordinates),
        Some("MultiLineString") => {
            serde_json::from_value::<Vec<Vec<GeoPoint>>>(coordinates)
                .map(|mut lines| {
                    if lines.len() == 1 {
                        RouteShape::LineString(lines.remove(0))
                    } else {
                        RouteShape::LineString(lines.concat())
                    }
                })
                .map_err(MalformedGeometry::BadCoordinates)
        }
        other => Err(MalformedGeometry::UnknownKind(other.map(str::to_owned))),
    }
}
