//! SQLite place store
//!
//! One `places` table keyed by the raw query string. The primary key enforces
//! at most one row per query and inserts use `ON CONFLICT DO NOTHING`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tokio::task;
use tracing::{debug, instrument};

use super::PlaceStore;
use crate::models::PlaceRecord;
use crate::{ExplorerError, Result};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS places (
    search_query    TEXT PRIMARY KEY,
    formatted_query TEXT NOT NULL,
    latitude        REAL NOT NULL,
    longitude       REAL NOT NULL,
    created_at      TEXT NOT NULL
);";

/// Persistent store backed by a single SQLite connection
#[derive(Clone)]
pub struct SqlitePlaceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlaceStore {
    /// Open (or create) the database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ExplorerError::store(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Database that lives only as long as this store
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection off the async runtime
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| ExplorerError::store("connection mutex poisoned"))?;
            f(&mut *guard).map_err(ExplorerError::from)
        })
        .await?
    }
}

fn select_place(conn: &Connection, query: &str) -> rusqlite::Result<Option<PlaceRecord>> {
    conn.query_row(
        "SELECT search_query, formatted_query, latitude, longitude \
         FROM places WHERE search_query = ?1",
        params![query],
        |row| {
            Ok(PlaceRecord {
                search_query: row.get(0)?,
                formatted_query: row.get(1)?,
                latitude: row.get(2)?,
                longitude: row.get(3)?,
            })
        },
    )
    .optional()
}

#[async_trait]
impl PlaceStore for SqlitePlaceStore {
    #[instrument(name = "store_lookup", level = "debug", skip(self))]
    async fn lookup(&self, query: &str) -> Result<Option<PlaceRecord>> {
        let query = query.to_string();
        self.with_conn(move |conn| select_place(conn, &query)).await
    }

    #[instrument(name = "store_insert", level = "debug", skip(self, record), fields(query = %record.search_query))]
    async fn store(&self, record: PlaceRecord) -> Result<PlaceRecord> {
        let created_at = Utc::now().to_rfc3339();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT INTO places (search_query, formatted_query, latitude, longitude, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(search_query) DO NOTHING",
                params![
                    record.search_query,
                    record.formatted_query,
                    record.latitude,
                    record.longitude,
                    created_at
                ],
            )?;
            if inserted == 0 {
                debug!("Record already present, keeping stored row");
            }
            let stored = select_place(&tx, &record.search_query)?;
            tx.commit()?;
            Ok(stored.unwrap_or(record))
        })
        .await
    }

    async fn all(&self) -> Result<Vec<PlaceRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT search_query, formatted_query, latitude, longitude \
                 FROM places ORDER BY rowid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(PlaceRecord {
                    search_query: row.get(0)?,
                    formatted_query: row.get(1)?,
                    latitude: row.get(2)?,
                    longitude: row.get(3)?,
                })
            })?;
            let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn boulder() -> PlaceRecord {
        PlaceRecord::new("Boulder", "Boulder, CO, USA", 40.01, -105.27)
    }

    #[tokio::test]
    async fn test_open_creates_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("places.db");
        let store = SqlitePlaceStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let store = SqlitePlaceStore::open_in_memory().unwrap();
        assert!(store.lookup("Boulder").await.unwrap().is_none());

        let stored = store.store(boulder()).await.unwrap();
        assert_eq!(stored, boulder());
        assert_eq!(store.lookup("Boulder").await.unwrap(), Some(boulder()));
    }

    #[tokio::test]
    async fn test_duplicate_store_keeps_first_row() {
        let store = SqlitePlaceStore::open_in_memory().unwrap();
        store.store(boulder()).await.unwrap();

        let other = PlaceRecord::new("Boulder", "Boulder City, NV, USA", 35.97, -114.83);
        let returned = store.store(other).await.unwrap();

        assert_eq!(returned, boulder());
        assert_eq!(store.all().await.unwrap(), vec![boulder()]);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("places.db");

        {
            let store = SqlitePlaceStore::open(&path).unwrap();
            store.store(boulder()).await.unwrap();
            store
                .store(PlaceRecord::new("Seattle", "Seattle, WA, USA", 47.6, -122.33))
                .await
                .unwrap();
        }

        let reopened = SqlitePlaceStore::open(&path).unwrap();
        let all = reopened.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], boulder());
        assert_eq!(all[1].search_query, "Seattle");
    }

    #[tokio::test]
    async fn test_concurrent_stores_produce_one_row() {
        let store = SqlitePlaceStore::open_in_memory().unwrap();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .store(PlaceRecord::new("Seattle", format!("Seattle #{i}"), 47.6, -122.33))
                        .await
                })
            })
            .collect();

        let mut returned = Vec::new();
        for handle in handles {
            returned.push(handle.await.unwrap().unwrap());
        }

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        // Every caller sees the row that won
        assert!(returned.iter().all(|record| *record == all[0]));
    }
}
