use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;

use crate::ExampleData;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub plate: String,
    pub brand: String,
    pub model: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub owner_id: String,
}

fn default_active() -> bool {
    true
}

impl HasId for Vehicle {
    type IdType = i32;
}

impl Vehicle {
    /// Returns the vehicle with its plate in canonical `ABC-123` form.
    pub fn normalized(self) -> Self {
        Self {
            plate: normalize_plate(&self.plate),
            brand: self.brand.trim().to_owned(),
            model: self.model.trim().to_owned(),
            ..self
        }
    }
}

impl ExampleData for Vehicle {
    fn example_data() -> Self {
        Self {
            plate: "DEF-456".to_owned(),
            brand: "Chevrolet".to_owned(),
            model: "NPR".to_owned(),
            active: true,
            owner_id: "a4cdc1ca-5e37-40b1-8a4b-d26237e25142".to_owned(),
        }
    }
}

/// Uppercases, drops everything but `A-Z0-9`, keeps six characters and
/// separates letters from digits with a dash after the third one.
pub fn normalize_plate(raw: &str) -> String {
    let cleaned = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .take(6)
        .collect::<String>();
    if cleaned.len() > 3 {
        format!("{}-{}", &cleaned[..3], &cleaned[3..])
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plates_are_normalized() {
        assert_eq!(normalize_plate("abc123"), "ABC-123");
        assert_eq!(normalize_plate(" a b-c 1.2.3 "), "ABC-123");
        assert_eq!(normalize_plate("def4567"), "DEF-456");
        assert_eq!(normalize_plate("gh"), "GH");
        assert_eq!(normalize_plate("ñañ-12"), "A12");
        assert_eq!(normalize_plate(""), "");
    }

    #[test]
    fn vehicles_default_to_active() {
        let vehicle: Vehicle = serde_json::from_str(
            r#"{"plate": "abc123", "brand": " Kenworth ", "model": "T800", "ownerId": "p1"}"#,
        )
        .unwrap();
        let vehicle = vehicle.normalized();
        assert!(vehicle.active);
        assert_eq!(vehicle.plate, "ABC-123");
        assert_eq!(vehicle.brand, "Kenworth");
    }
}
