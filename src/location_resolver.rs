//! Location Resolution Module
//!
//! Resolves place names to [`PlaceRecord`]s with a cache-aside lookup: the
//! store is consulted first and the geocoder is only called on a miss, after
//! which the result is written back. Misses are serialized per query so that
//! concurrent requests for the same unseen place produce one upstream call and
//! one stored record.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, instrument};

use crate::Result;
use crate::config::ProviderConfig;
use crate::models::PlaceRecord;
use crate::providers::{Upstream, google};
use crate::store::PlaceStore;

/// Service for resolving place names
pub struct LocationResolver {
    store: Arc<dyn PlaceStore>,
    upstream: Arc<dyn Upstream>,
    geocode: ProviderConfig,
    locks: KeyLocks,
}

impl LocationResolver {
    pub fn new(
        store: Arc<dyn PlaceStore>,
        upstream: Arc<dyn Upstream>,
        geocode: ProviderConfig,
    ) -> Self {
        Self {
            store,
            upstream,
            geocode,
            locks: KeyLocks::default(),
        }
    }

    /// Resolve a place name, calling the geocoder only if it was never seen
    #[instrument(name = "resolve_location", skip(self))]
    pub async fn resolve(&self, query: &str) -> Result<PlaceRecord> {
        if let Some(record) = self.store.lookup(query).await? {
            debug!("Serving place from store");
            return Ok(record);
        }

        let _key_guard = self.locks.acquire(query).await;

        // Another request may have stored it while we waited
        if let Some(record) = self.store.lookup(query).await? {
            debug!("Place stored by a concurrent request");
            return Ok(record);
        }

        info!("Place not stored, calling geocoder");
        let request = google::geocode_request(&self.geocode, query);
        let body = self.upstream.fetch(&request).await?;
        let record = google::normalize_place(query, body)?;
        let stored = self.store.store(record).await?;

        debug!(
            "Resolved place: {} at {}",
            stored.formatted_query,
            stored.coordinates().to_path_segment()
        );
        Ok(stored)
    }

    /// Every stored place
    pub async fn places(&self) -> Result<Vec<PlaceRecord>> {
        self.store.all().await
    }
}

/// Async mutex per query key; idle entries are removed on release
#[derive(Default)]
struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &str) -> KeyGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };

        // Built before awaiting so a cancelled wait still cleans up
        let mut guard = KeyGuard {
            locks: self,
            key: key.to_string(),
            lock: Arc::clone(&lock),
            held: None,
        };
        guard.held = Some(lock.lock_owned().await);
        guard
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: String,
    lock: Arc<AsyncMutex<()>>,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        let mut locks = self
            .locks
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here: nobody else is waiting
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}
