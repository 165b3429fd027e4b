//! Place model for resolved locations

use serde::{Deserialize, Serialize};

/// Persisted result of resolving a place name
///
/// `search_query` is the raw query string as the client sent it and is the
/// unique key of the record.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlaceRecord {
    pub search_query: String,
    pub formatted_query: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl PlaceRecord {
    #[must_use]
    pub fn new(
        search_query: impl Into<String>,
        formatted_query: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            search_query: search_query.into(),
            formatted_query: formatted_query.into(),
            latitude,
            longitude,
        }
    }

    /// Coordinates of this place
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Location coordinates in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting values outside the valid ranges
    #[must_use]
    pub fn checked(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Format as `lat,lng` for provider URLs
    #[must_use]
    pub fn to_path_segment(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_record_serializes_with_wire_names() {
        let record = PlaceRecord::new("Boulder", "Boulder, CO, USA", 40.01, -105.27);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "search_query": "Boulder",
                "formatted_query": "Boulder, CO, USA",
                "latitude": 40.01,
                "longitude": -105.27,
            })
        );
    }

    #[test]
    fn test_coordinates_checked() {
        assert!(Coordinates::checked(47.6, -122.3).is_some());
        assert!(Coordinates::checked(90.0, 180.0).is_some());
        assert!(Coordinates::checked(90.1, 0.0).is_none());
        assert!(Coordinates::checked(0.0, -180.5).is_none());
        assert!(Coordinates::checked(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_coordinates_path_segment() {
        let coordinates = PlaceRecord::new("Seattle", "Seattle, WA, USA", 47.6062, -122.3321)
            .coordinates();
        assert_eq!(coordinates.to_path_segment(), "47.6062,-122.3321");
    }
}
