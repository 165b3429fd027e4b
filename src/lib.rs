//! City Explorer - location, weather, trail and event aggregation backend
//!
//! Resolves place names through a geocoder with a persistent cache-aside
//! store, and proxies weather, trail and event lookups for coordinates,
//! reshaping every provider response into a small fixed JSON schema.

pub mod api;
pub mod config;
pub mod error;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod providers;
pub mod store;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use config::ExplorerConfig;
pub use error::ExplorerError;
pub use location_resolver::LocationResolver;
pub use models::{Coordinates, Event, Forecast, PlaceRecord, Trail};
pub use providers::{HttpUpstream, Upstream, UpstreamRequest};
pub use store::{MemoryPlaceStore, PlaceStore, SqlitePlaceStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ExplorerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
