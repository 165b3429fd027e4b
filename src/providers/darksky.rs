//! Dark Sky style daily forecast API

use chrono::FixedOffset;
use serde::Deserialize;
use serde_json::Value;

use super::{Credential, Provider, UpstreamRequest, credential_from, decode};
use crate::config::ProviderConfig;
use crate::models::{Coordinates, Forecast};
use crate::{ExplorerError, Result};

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    /// Hours from UTC at the forecast location
    offset: Option<f64>,
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    data: Vec<DailyPoint>,
}

#[derive(Debug, Deserialize)]
struct DailyPoint {
    summary: String,
    /// Unix seconds at the start of the day
    time: i64,
}

/// Request for the forecast at the given coordinates
#[must_use]
pub fn forecast_request(config: &ProviderConfig, coordinates: Coordinates) -> UpstreamRequest {
    UpstreamRequest::new(Provider::Weather, config.base_url.clone())
        .path_segment(coordinates.to_path_segment())
        .credential(credential_from(
            config.api_key.as_ref(),
            Credential::PathSegment,
        ))
}

/// Map `daily.data[]` into forecast entries, preserving order
///
/// Days are labelled in the location's own timezone, or UTC when the body
/// carries no `offset`.
pub fn normalize_forecasts(body: Value) -> Result<Vec<Forecast>> {
    let response: ForecastResponse = decode(Provider::Weather, body)?;
    let offset = location_offset(response.offset)?;

    response
        .daily
        .data
        .into_iter()
        .map(|day| {
            let time = day.time;
            Forecast::from_unix(day.summary, time, offset).ok_or_else(|| {
                ExplorerError::provider(
                    Provider::Weather.name(),
                    format!("timestamp {time} out of range"),
                )
            })
        })
        .collect()
}

fn location_offset(hours: Option<f64>) -> Result<FixedOffset> {
    let seconds = hours.map_or(0, |hours| (hours * 3600.0).round() as i32);
    FixedOffset::east_opt(seconds).ok_or_else(|| {
        ExplorerError::provider(
            Provider::Weather.name(),
            format!("utc offset {seconds}s out of range"),
        )
    })
}
