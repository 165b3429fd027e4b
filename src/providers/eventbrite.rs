//! Eventbrite style event search API

use serde::Deserialize;
use serde_json::Value;

use super::{Credential, Provider, UpstreamRequest, credential_from, decode};
use crate::config::ProviderConfig;
use crate::models::{Coordinates, Event};
use crate::{ExplorerError, Result};

#[derive(Debug, Deserialize)]
struct EventsResponse {
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    url: String,
    name: MultipartText,
    start: EventStart,
    summary: String,
}

#[derive(Debug, Deserialize)]
struct MultipartText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct EventStart {
    /// `YYYY-MM-DDTHH:MM:SS` in the venue's time zone
    local: String,
}

/// Request for events around the given coordinates
#[must_use]
pub fn events_request(config: &ProviderConfig, coordinates: Coordinates) -> UpstreamRequest {
    UpstreamRequest::new(Provider::Events, config.base_url.clone())
        .param("location.longitude", coordinates.longitude.to_string())
        .param("location.latitude", coordinates.latitude.to_string())
        .param("expand", "venue")
        .credential(credential_from(config.api_key.as_ref(), |key| {
            Credential::QueryParam { name: "token", key }
        }))
}

/// Map `events[]` into event entries, preserving order
pub fn normalize_events(body: Value) -> Result<Vec<Event>> {
    let response: EventsResponse = decode(Provider::Events, body)?;
    response.events.into_iter().map(Event::try_from).collect()
}

impl TryFrom<RawEvent> for Event {
    type Error = ExplorerError;

    fn try_from(raw: RawEvent) -> Result<Self> {
        let event_date = raw.start.local.get(..10).ok_or_else(|| {
            ExplorerError::provider(
                Provider::Events.name(),
                format!("malformed start.local '{}'", raw.start.local),
            )
        })?;

        Ok(Event {
            link: raw.url,
            name: raw.name.text,
            event_date: event_date.to_string(),
            summary: raw.summary,
        })
    }
}
