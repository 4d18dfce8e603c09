use chrono::{DateTime, Local};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::{geometry::GeoPoint, route::Route, ExampleData};

/// A position sample sent while a vehicle drives a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    pub lat: f64,
    pub lon: f64,
    #[serde(alias = "perfil_id")]
    pub owner_id: String,
}

impl PositionReport {
    pub fn new<S: Into<String>>(point: GeoPoint, owner_id: S) -> Self {
        Self {
            lat: point.latitude,
            lon: point.longitude,
            owner_id: owner_id.into(),
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lon, self.lat)
    }
}

impl ExampleData for PositionReport {
    fn example_data() -> Self {
        Self {
            lat: 3.8851,
            lon: -77.0288,
            owner_id: "a4cdc1ca-5e37-40b1-8a4b-d26237e25142".to_owned(),
        }
    }
}

/// A stored position of a run. Runs are identified by the route they follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordedPosition {
    pub run_id: Id<Route>,
    pub lat: f64,
    pub lon: f64,
    pub owner_id: String,
    pub recorded_at: DateTime<Local>,
}

impl HasId for RecordedPosition {
    type IdType = i64;
}

impl RecordedPosition {
    pub fn from_report(run_id: Id<Route>, report: PositionReport) -> Self {
        Self {
            run_id,
            lat: report.lat,
            lon: report.lon,
            owner_id: report.owner_id,
            recorded_at: Local::now(),
        }
    }
}

impl ExampleData for RecordedPosition {
    fn example_data() -> Self {
        Self::from_report(Id::new(1), PositionReport::example_data())
    }
}
