//! Query parameter extraction
//!
//! Coordinates arrive as `data[latitude]`/`data[longitude]` (the form browsers
//! and jQuery produce for nested objects) or as `data.latitude`/`data.longitude`.

use std::collections::HashMap;

use axum::extract::Query;
use axum::extract::rejection::QueryRejection;

use crate::models::Coordinates;
use crate::{ExplorerError, Result};

pub type RawParams = std::result::Result<Query<HashMap<String, String>>, QueryRejection>;

fn decode(params: RawParams) -> Result<HashMap<String, String>> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| ExplorerError::malformed(rejection.body_text()))
}

/// The place name passed as `data`
pub fn place_query(params: RawParams) -> Result<String> {
    let mut params = decode(params)?;
    match params.remove("data") {
        Some(query) if !query.trim().is_empty() => Ok(query),
        Some(_) => Err(ExplorerError::malformed("data must not be empty")),
        None => Err(ExplorerError::malformed("data is required")),
    }
}

/// The coordinates passed as `data[latitude]` and `data[longitude]`
pub fn coordinates(params: RawParams) -> Result<Coordinates> {
    let params = decode(params)?;
    let latitude = coordinate(&params, "latitude")?;
    let longitude = coordinate(&params, "longitude")?;

    Coordinates::checked(latitude, longitude).ok_or_else(|| {
        ExplorerError::malformed(format!(
            "coordinates ({latitude}, {longitude}) are out of range"
        ))
    })
}

fn coordinate(params: &HashMap<String, String>, field: &str) -> Result<f64> {
    let raw = params
        .get(&format!("data[{field}]"))
        .or_else(|| params.get(&format!("data.{field}")))
        .ok_or_else(|| ExplorerError::malformed(format!("data[{field}] is required")))?;

    raw.trim()
        .parse::<f64>()
        .map_err(|_| ExplorerError::malformed(format!("data[{field}] must be a number")))
}
