//! Domain models for the plant catalog.
//!
//! These types represent catalog data in a clean domain format.
//! Wire field names follow the upstream catalog's camelCase JSON.

use serde::{Deserialize, Serialize};

/// A growing zone used as an optional roster filter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrowZone(pub i32);

impl GrowZone {
    /// The numeric zone value.
    pub fn number(&self) -> i32 {
        self.0
    }
}

/// A plant in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub plant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub grow_zone_number: i32,
    /// How often to water, in days.
    #[serde(default = "default_watering_interval")]
    pub watering_interval: i32,
    #[serde(default)]
    pub image_url: String,
}

/// Plants without an explicit cadence are watered weekly.
fn default_watering_interval() -> i32 {
    7
}

impl Plant {
    /// The zone this plant grows in, as a filter key.
    pub fn grow_zone(&self) -> GrowZone {
        GrowZone(self.grow_zone_number)
    }

    /// One-line watering cadence for list display.
    pub fn watering_summary(&self) -> String {
        match self.watering_interval {
            1 => "water daily".to_string(),
            days => format!("water every {} days", days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plant_deserializes_camel_case_wire_names() {
        let json = r#"{
            "plantId": "malus-pumila",
            "name": "Apple",
            "description": "An apple tree.",
            "growZoneNumber": 3,
            "wateringInterval": 30,
            "imageUrl": "https://example.com/apple.jpg"
        }"#;

        let plant: Plant = serde_json::from_str(json).expect("Failed to parse plant JSON");
        assert_eq!(plant.plant_id, "malus-pumila");
        assert_eq!(plant.grow_zone_number, 3);
        assert_eq!(plant.watering_interval, 30);
        assert_eq!(plant.grow_zone(), GrowZone(3));
    }

    #[test]
    fn test_plant_watering_interval_defaults_to_weekly() {
        let json = r#"{"plantId": "x", "name": "X", "growZoneNumber": 1}"#;
        let plant: Plant = serde_json::from_str(json).expect("Failed to parse plant JSON");
        assert_eq!(plant.watering_interval, 7);
        assert_eq!(plant.watering_summary(), "water every 7 days");
    }

    #[test]
    fn test_watering_summary_daily() {
        let json = r#"{"plantId": "x", "name": "X", "growZoneNumber": 1, "wateringInterval": 1}"#;
        let plant: Plant = serde_json::from_str(json).expect("Failed to parse plant JSON");
        assert_eq!(plant.watering_summary(), "water daily");
    }
}
