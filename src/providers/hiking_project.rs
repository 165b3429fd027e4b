//! Hiking Project style trail search API

use serde::Deserialize;
use serde_json::Value;

use super::{Credential, Provider, UpstreamRequest, credential_from, decode};
use crate::config::ProviderConfig;
use crate::models::{Coordinates, Trail};
use crate::{ExplorerError, Result};

#[derive(Debug, Deserialize)]
struct TrailsResponse {
    trails: Vec<RawTrail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrail {
    name: String,
    location: String,
    length: f64,
    stars: f64,
    star_votes: u32,
    summary: String,
    url: String,
    condition_status: String,
    /// `YYYY-MM-DD HH:MM:SS`
    condition_date: String,
}

/// Request for trails around the given coordinates
#[must_use]
pub fn trails_request(config: &ProviderConfig, coordinates: Coordinates) -> UpstreamRequest {
    UpstreamRequest::new(Provider::Trails, config.base_url.clone())
        .param("lat", coordinates.latitude.to_string())
        .param("lon", coordinates.longitude.to_string())
        .credential(credential_from(config.api_key.as_ref(), |key| {
            Credential::QueryParam { name: "key", key }
        }))
}

/// Map `trails[]` into trail entries, preserving order
pub fn normalize_trails(body: Value) -> Result<Vec<Trail>> {
    let response: TrailsResponse = decode(Provider::Trails, body)?;
    response.trails.into_iter().map(Trail::try_from).collect()
}

impl TryFrom<RawTrail> for Trail {
    type Error = ExplorerError;

    fn try_from(raw: RawTrail) -> Result<Self> {
        let (condition_date, condition_time) =
            split_condition_date(&raw.condition_date).ok_or_else(|| {
                ExplorerError::provider(
                    Provider::Trails.name(),
                    format!("malformed conditionDate '{}'", raw.condition_date),
                )
            })?;

        Ok(Trail {
            name: raw.name,
            location: raw.location,
            length: raw.length,
            stars: raw.stars,
            star_votes: raw.star_votes,
            summary: raw.summary,
            trail_url: raw.url,
            conditions: raw.condition_status,
            condition_date: condition_date.to_string(),
            condition_time: condition_time.to_string(),
        })
    }
}

fn split_condition_date(timestamp: &str) -> Option<(&str, &str)> {
    Some((timestamp.get(..10)?, timestamp.get(11..)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ApiKey;
    use serde_json::json;

    fn raw_trail(condition_date: &str) -> Value {
        json!({
            "id": 7011192,
            "name": "Rattlesnake Ledge",
            "type": "Featured Hike",
            "summary": "A short climb to sweeping views.",
            "location": "North Bend, Washington",
            "url": "https://www.hikingproject.com/trail/7011192/rattlesnake-ledge",
            "length": 4.3,
            "stars": 4.4,
            "starVotes": 62,
            "conditionStatus": "All Clear",
            "conditionDate": condition_date
        })
    }

    #[test]
    fn test_normalize_trails() {
        let body = json!({ "trails": [raw_trail("2019-05-03 09:13:27")], "success": 1 });

        let trails = normalize_trails(body).unwrap();
        assert_eq!(trails.len(), 1);
        let trail = &trails[0];
        assert_eq!(trail.name, "Rattlesnake Ledge");
        assert_eq!(trail.location, "North Bend, Washington");
        assert_eq!(trail.length, 4.3);
        assert_eq!(trail.stars, 4.4);
        assert_eq!(trail.star_votes, 62);
        assert_eq!(trail.summary, "A short climb to sweeping views.");
        assert_eq!(
            trail.trail_url,
            "https://www.hikingproject.com/trail/7011192/rattlesnake-ledge"
        );
        assert_eq!(trail.conditions, "All Clear");
        assert_eq!(trail.condition_date, "2019-05-03");
        assert_eq!(trail.condition_time, "09:13:27");
    }

    #[test]
    fn test_normalize_rejects_short_condition_date() {
        let body = json!({ "trails": [raw_trail("2019")] });
        let err = normalize_trails(body).unwrap_err();
        assert!(err.to_string().contains("malformed conditionDate"));
    }

    #[test]
    fn test_normalize_rejects_missing_field() {
        let mut trail = raw_trail("2019-05-03 09:13:27");
        trail.as_object_mut().unwrap().remove("starVotes");
        let err = normalize_trails(json!({ "trails": [trail] })).unwrap_err();
        assert!(err.to_string().contains("starVotes"));
    }

    #[test]
    fn test_trails_request() {
        let config = ProviderConfig {
            base_url: "https://trails.example.com/get-trails".to_string(),
            api_key: Some(ApiKey::new("hike")),
        };
        let coordinates = Coordinates::checked(47.6062, -122.3321).unwrap();
        let request = trails_request(&config, coordinates);
        assert_eq!(request.param_value("lat"), Some("47.6062"));
        assert_eq!(request.param_value("lon"), Some("-122.3321"));
        let (url, params) = request.resolve();
        assert_eq!(url, "https://trails.example.com/get-trails");
        assert!(params.contains(&("key".to_string(), "hike".to_string())));
    }
}
