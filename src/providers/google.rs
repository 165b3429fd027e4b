//! Google geocoding API

use serde::Deserialize;
use serde_json::Value;

use super::{Credential, Provider, UpstreamRequest, credential_from, decode};
use crate::config::ProviderConfig;
use crate::models::PlaceRecord;
use crate::{ExplorerError, Result};

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Vec<GeocodeResult>,
    status: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Request resolving a free-form place name
#[must_use]
pub fn geocode_request(config: &ProviderConfig, query: &str) -> UpstreamRequest {
    UpstreamRequest::new(Provider::Geocode, config.base_url.clone())
        .param("address", query)
        .credential(credential_from(config.api_key.as_ref(), |key| {
            Credential::QueryParam { name: "key", key }
        }))
}

/// Build a place record from the first geocoding result
pub fn normalize_place(query: &str, body: Value) -> Result<PlaceRecord> {
    let response: GeocodeResponse = decode(Provider::Geocode, body)?;

    match response.status.as_deref() {
        None | Some("OK" | "ZERO_RESULTS") => {}
        Some(status) => {
            let detail = response.error_message.as_deref().unwrap_or("no details");
            return Err(ExplorerError::provider(
                Provider::Geocode.name(),
                format!("status {status}: {detail}"),
            ));
        }
    }

    let first = response.results.into_iter().next().ok_or_else(|| {
        ExplorerError::provider(
            Provider::Geocode.name(),
            format!("no results for '{query}'"),
        )
    })?;

    Ok(PlaceRecord::new(
        query,
        first.formatted_address,
        first.geometry.location.lat,
        first.geometry.location.lng,
    ))
}
