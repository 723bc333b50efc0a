//! In-memory [`FavoriteStore`] implementation for tests and diskless hosts.
//!
//! Records live in a `HashMap` behind a `std::sync::RwLock`. A toggle holds
//! the write lock across the check, the mutation and the publish, which is
//! what makes it atomic and keeps subscriber emissions in mutation order.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::watch;

use rickdex_core::models::{Character, FavoriteRecord};

use super::{check_snapshot, next_added_at, now_millis, sort_newest_first, FavoriteStore, Toggled};
use crate::error::{Error, Result};

pub struct InMemoryFavoriteStore {
    records: RwLock<HashMap<i64, FavoriteRecord>>,
    tx: watch::Sender<Vec<FavoriteRecord>>,
}

impl InMemoryFavoriteStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            records: RwLock::new(HashMap::new()),
            tx,
        }
    }

    /// Seed the store with existing records (e.g. a restored session).
    pub fn with_records(records: impl IntoIterator<Item = FavoriteRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write().unwrap_or_else(|e| e.into_inner());
            for r in records {
                map.insert(r.id, r);
            }
            store.tx.send_replace(ordered(&map));
        }
        store
    }
}

impl Default for InMemoryFavoriteStore {
    fn default() -> Self {
        Self::new()
    }
}

fn ordered(map: &HashMap<i64, FavoriteRecord>) -> Vec<FavoriteRecord> {
    let mut list: Vec<FavoriteRecord> = map.values().cloned().collect();
    sort_newest_first(&mut list);
    list
}

fn poisoned() -> Error {
    Error::Storage("favorite map lock poisoned".to_string())
}

#[async_trait]
impl FavoriteStore for InMemoryFavoriteStore {
    async fn is_favorite(&self, id: i64) -> Result<bool> {
        let map = self.records.read().map_err(|_| poisoned())?;
        Ok(map.contains_key(&id))
    }

    async fn toggle(&self, id: i64, snapshot: Option<&Character>) -> Result<Toggled> {
        check_snapshot(id, snapshot)?;
        let mut map = self.records.write().map_err(|_| poisoned())?;
        let outcome = if map.remove(&id).is_some() {
            Toggled::Removed
        } else {
            let newest = map.values().map(|r| r.added_at).max();
            map.insert(
                id,
                FavoriteRecord {
                    id,
                    snapshot: snapshot.cloned(),
                    added_at: next_added_at(now_millis(), newest),
                },
            );
            Toggled::Added
        };
        self.tx.send_replace(ordered(&map));
        Ok(outcome)
    }

    async fn favorite_ids(&self) -> Result<Vec<i64>> {
        let map = self.records.read().map_err(|_| poisoned())?;
        Ok(ordered(&map).into_iter().map(|r| r.id).collect())
    }

    async fn favorites(&self) -> Result<Vec<FavoriteRecord>> {
        let map = self.records.read().map_err(|_| poisoned())?;
        Ok(ordered(&map))
    }

    fn subscribe(&self) -> watch::Receiver<Vec<FavoriteRecord>> {
        self.tx.subscribe()
    }
}
