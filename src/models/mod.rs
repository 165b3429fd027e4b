//! Data models for the City Explorer backend
//!
//! These are the response shapes sent to clients:
//! - Place: resolved place names and the coordinates used by other endpoints
//! - Forecast: daily weather summaries
//! - Trail: nearby hiking trails
//! - Event: nearby events

pub mod event;
pub mod forecast;
pub mod place;
pub mod trail;

// Re-export all public types for convenient access
pub use event::Event;
pub use forecast::Forecast;
pub use place::{Coordinates, PlaceRecord};
pub use trail::Trail;
