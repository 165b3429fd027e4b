//! Place store
//!
//! Maps a raw query string to the [`PlaceRecord`] it resolved to. Writes are
//! first-write-wins: storing a record for a query that already has one keeps
//! the existing record and returns it.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::Result;
use crate::models::PlaceRecord;

pub use memory::MemoryPlaceStore;
pub use sqlite::SqlitePlaceStore;

#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// Exact-match lookup by query string
    async fn lookup(&self, query: &str) -> Result<Option<PlaceRecord>>;

    /// Persist a record unless one already exists for its query.
    /// Returns the record that is stored after the call.
    async fn store(&self, record: PlaceRecord) -> Result<PlaceRecord>;

    /// All records in insertion order
    async fn all(&self) -> Result<Vec<PlaceRecord>>;
}
