use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::PlaceStore;
use crate::Result;
use crate::models::PlaceRecord;

/// Process-local store, lost on restart
#[derive(Default)]
pub struct MemoryPlaceStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, PlaceRecord>,
    order: Vec<String>,
}

impl MemoryPlaceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlaceStore for MemoryPlaceStore {
    async fn lookup(&self, query: &str) -> Result<Option<PlaceRecord>> {
        Ok(self.inner.read().await.records.get(query).cloned())
    }

    async fn store(&self, record: PlaceRecord) -> Result<PlaceRecord> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.records.get(&record.search_query) {
            return Ok(existing.clone());
        }
        inner.order.push(record.search_query.clone());
        inner
            .records
            .insert(record.search_query.clone(), record.clone());
        Ok(record)
    }

    async fn all(&self) -> Result<Vec<PlaceRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|query| inner.records.get(query).cloned())
            .collect())
    }
}
