use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::config::ProvidersConfig;
use crate::location_resolver::LocationResolver;
use crate::models::{Coordinates, Event, Forecast, PlaceRecord, Trail};
use crate::providers::{Upstream, UpstreamRequest, darksky, eventbrite, hiking_project};
use crate::{ExplorerError, Result};

pub mod params;

use params::RawParams;

/// Shared state of all handlers
pub struct AppState {
    pub locations: LocationResolver,
    pub upstream: Arc<dyn Upstream>,
    pub providers: ProvidersConfig,
}

impl AppState {
    pub fn new(
        locations: LocationResolver,
        upstream: Arc<dyn Upstream>,
        providers: ProvidersConfig,
    ) -> Self {
        Self {
            locations,
            upstream,
            providers,
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
}

/// Handler failure, rendered as a JSON error envelope
#[derive(Debug)]
pub struct ApiError(ExplorerError);

impl ApiError {
    /// Log the failure with its request context and wrap it for the response
    fn logged(endpoint: &'static str, context: &str, err: ExplorerError) -> Self {
        if err.status_code() < 500 {
            warn!(endpoint, context, "Rejected request: {}", err);
        } else {
            error!(endpoint, context, "Request failed: {}", err);
        }
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorEnvelope {
            error: ErrorBody {
                status: status.as_u16(),
                message: self.0.user_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/location", get(get_location))
        .route("/weather", get(get_weather))
        .route("/trails", get(get_trails))
        .route("/events", get(get_events))
        .route("/db", get(get_places))
        .with_state(state)
}

async fn get_location(
    State(state): State<Arc<AppState>>,
    params: RawParams,
) -> std::result::Result<Json<PlaceRecord>, ApiError> {
    const ENDPOINT: &str = "/location";

    let query = params::place_query(params).map_err(|e| ApiError::logged(ENDPOINT, "", e))?;

    state
        .locations
        .resolve(&query)
        .await
        .map(Json)
        .map_err(|e| ApiError::logged(ENDPOINT, &query, e))
}

async fn get_weather(
    State(state): State<Arc<AppState>>,
    params: RawParams,
) -> std::result::Result<Json<Vec<Forecast>>, ApiError> {
    let config = &state.providers.weather;
    fetch_near(
        &state,
        "/weather",
        params,
        |coordinates| darksky::forecast_request(config, coordinates),
        darksky::normalize_forecasts,
    )
    .await
}

async fn get_trails(
    State(state): State<Arc<AppState>>,
    params: RawParams,
) -> std::result::Result<Json<Vec<Trail>>, ApiError> {
    let config = &state.providers.trails;
    fetch_near(
        &state,
        "/trails",
        params,
        |coordinates| hiking_project::trails_request(config, coordinates),
        hiking_project::normalize_trails,
    )
    .await
}

async fn get_events(
    State(state): State<Arc<AppState>>,
    params: RawParams,
) -> std::result::Result<Json<Vec<Event>>, ApiError> {
    let config = &state.providers.events;
    fetch_near(
        &state,
        "/events",
        params,
        |coordinates| eventbrite::events_request(config, coordinates),
        eventbrite::normalize_events,
    )
    .await
}

async fn get_places(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Json<Vec<PlaceRecord>>, ApiError> {
    state
        .locations
        .places()
        .await
        .map(Json)
        .map_err(|e| ApiError::logged("/db", "", e))
}

/// Validate coordinates, make one upstream call and normalize its array
async fn fetch_near<T, B, N>(
    state: &AppState,
    endpoint: &'static str,
    params: RawParams,
    build: B,
    normalize: N,
) -> std::result::Result<Json<Vec<T>>, ApiError>
where
    B: FnOnce(Coordinates) -> UpstreamRequest,
    N: FnOnce(Value) -> Result<Vec<T>>,
{
    let coordinates =
        params::coordinates(params).map_err(|e| ApiError::logged(endpoint, "", e))?;
    let context = coordinates.to_path_segment();

    let request = build(coordinates);
    let body = state
        .upstream
        .fetch(&request)
        .await
        .map_err(|e| ApiError::logged(endpoint, &context, e))?;

    normalize(body)
        .map(Json)
        .map_err(|e| ApiError::logged(endpoint, &context, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: ExplorerError) -> (StatusCode, serde_json::Value) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_internal_errors_use_generic_envelope() {
        let (status, body) = render(ExplorerError::store("database is locked")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            serde_json::json!({
                "error": { "status": 500, "message": "Sorry, something went wrong" }
            })
        );
    }

    #[tokio::test]
    async fn test_malformed_requests_are_400() {
        let (status, body) = render(ExplorerError::malformed("data is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["status"], 400);
        assert_eq!(body["error"]["message"], "Invalid request: data is required");
    }
}
