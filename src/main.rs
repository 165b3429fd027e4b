use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use city_explorer::{
    AppState, ExplorerConfig, HttpUpstream, LocationResolver, MemoryPlaceStore, PlaceStore,
    SqlitePlaceStore, Upstream, logging, web,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ExplorerConfig::load()?;
    logging::init(&config.logging)?;

    info!("City Explorer {}", city_explorer::VERSION);
    for provider in config.missing_api_keys() {
        warn!("No API key configured for provider '{}'", provider);
    }

    let store: Arc<dyn PlaceStore> = match config.database.backend.as_str() {
        "memory" => {
            info!("Using in-memory place store");
            Arc::new(MemoryPlaceStore::new())
        }
        _ => {
            info!("Using SQLite place store at {}", config.database.path);
            Arc::new(
                SqlitePlaceStore::open(Path::new(&config.database.path))
                    .context("Failed to open place store")?,
            )
        }
    };

    let upstream: Arc<dyn Upstream> =
        Arc::new(HttpUpstream::new(&config.upstream).context("Failed to build upstream client")?);

    let locations = LocationResolver::new(
        store,
        Arc::clone(&upstream),
        config.providers.geocode.clone(),
    );
    let state = Arc::new(AppState::new(
        locations,
        upstream,
        config.providers.clone(),
    ));

    web::run(&config.server, state).await
}
