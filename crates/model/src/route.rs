use chrono::{DateTime, Local};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;

use crate::{
    geometry::{self, RawShape, RouteShape},
    ExampleData,
};

/// A named collection route owned by a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub name: String,
    pub owner_id: String,
    pub shape: RouteShape,
    pub created_at: DateTime<Local>,
}

impl HasId for Route {
    type IdType = i32;
}

impl Route {
    pub fn length_km(&self) -> f64 {
        self.shape.length_km()
    }
}

impl ExampleData for Route {
    fn example_data() -> Self {
        Self {
            name: "Ruta Norte".to_owned(),
            owner_id: "a4cdc1ca-5e37-40b1-8a4b-d26237e25142".to_owned(),
            shape: RouteShape::example_data(),
            created_at: Local::now(),
        }
    }
}

/// Body of a route creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoute {
    #[serde(deserialize_with = "utility::serde::trimmed::deserialize")]
    pub name: String,
    pub owner_id: String,
    pub shape: RouteShape,
}

/// A route record as any backend may send it, with the shape still raw.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord<Id> {
    pub id: Id,
    #[serde(alias = "nombre_ruta")]
    pub name: String,
    #[serde(alias = "perfil_id")]
    pub owner_id: String,
    pub shape: RawShape,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Local>>,
}

impl<Id> RouteRecord<Id> {
    /// Splits off the id and returns the route with a normalized shape.
    pub fn normalize(self) -> (Id, Route) {
        let route = Route {
            name: self.name,
            owner_id: self.owner_id,
            shape: geometry::normalize(self.shape),
            created_at: self.created_at.unwrap_or_else(Local::now),
        };
        (self.id, route)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::geometry::GeoPoint;

    #[test]
    fn record_with_string_shape_is_normalized() {
        let record: RouteRecord<i32> = serde_json::from_value(json!({
            "id": 7,
            "name": "Ruta Sur",
            "ownerId": "p1",
            "shape": "{\"type\":\"LineString\",\"coordinates\":[[1,2],[3,4]]}"
        }))
        .unwrap();
        let (id, route) = record.normalize();
        assert_eq!(id, 7);
        assert_eq!(route.name, "Ruta Sur");
        assert_eq!(
            route.shape,
            RouteShape::LineString(vec![GeoPoint::new(1.0, 2.0), GeoPoint::new(3.0, 4.0)])
        );
    }

    #[test]
    fn record_accepts_legacy_field_names() {
        let record: RouteRecord<String> = serde_json::from_value(json!({
            "id": "r-1",
            "nombre_ruta": "Ruta Centro",
            "perfil_id": "p1",
            "shape": {"type": "Polygon", "coordinates": []}
        }))
        .unwrap();
        let (id, route) = record.normalize();
        assert_eq!(id, "r-1");
        assert_eq!(route.owner_id, "p1");
        assert!(route.shape.is_empty());
    }

    #[test]
    fn new_route_name_is_trimmed() {
        let new_route: NewRoute = serde_json::from_value(json!({
            "name": "  Ruta Norte ",
            "ownerId": "p1",
            "shape": {"type": "LineString", "coordinates": [[1, 2], [3, 4]]}
        }))
        .unwrap();
        assert_eq!(new_route.name, "Ruta Norte");
    }
}
