//! Favorite storage abstraction.
//!
//! The [`FavoriteStore`] is the single owner of favorite truth. Every other
//! component reads favorite status through it at the moment it needs it and
//! never keeps a favorite boolean beyond one render pass.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`is_favorite`](FavoriteStore::is_favorite) | Point lookup, absence is `false` |
//! | [`toggle`](FavoriteStore::toggle) | Insert or hard-delete a record, atomically per id |
//! | [`favorite_ids`](FavoriteStore::favorite_ids) | Ids, most recently added first |
//! | [`favorites`](FavoriteStore::favorites) | Full records, most recently added first |
//! | [`subscribe`](FavoriteStore::subscribe) | Live list, replays the latest value to late subscribers |
//!
//! Implementations publish the new list to subscribers before `toggle`
//! returns, so a read issued right after a toggle never sees the old state.

pub mod memory;

use async_trait::async_trait;
use tokio::sync::watch;

use rickdex_core::models::{Character, FavoriteRecord};

use crate::error::{Error, Result};

pub use memory::InMemoryFavoriteStore;

/// Outcome of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

impl Toggled {
    pub fn is_favorite(&self) -> bool {
        matches!(self, Toggled::Added)
    }
}

/// Persisted favorites, owned by one writer.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Whether `id` is currently a favorite.
    async fn is_favorite(&self, id: i64) -> Result<bool>;

    /// Delete the record for `id` if present, otherwise insert one.
    ///
    /// `snapshot`, when given, is stored alongside the id for offline
    /// display and must describe the same id. Concurrent toggles of the
    /// same id are serialized.
    async fn toggle(&self, id: i64, snapshot: Option<&Character>) -> Result<Toggled>;

    /// Favorite ids ordered by `added_at` descending.
    async fn favorite_ids(&self) -> Result<Vec<i64>>;

    /// Favorite records ordered by `added_at` descending.
    async fn favorites(&self) -> Result<Vec<FavoriteRecord>>;

    /// Live favorites list. The receiver immediately holds the current list.
    fn subscribe(&self) -> watch::Receiver<Vec<FavoriteRecord>>;
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `added_at` for a new record: the wall clock, bumped past the newest
/// existing record so the latest insert always sorts first.
pub(crate) fn next_added_at(now: i64, newest: Option<i64>) -> i64 {
    match newest {
        Some(newest) if newest >= now => newest + 1,
        _ => now,
    }
}

pub(crate) fn check_snapshot(id: i64, snapshot: Option<&Character>) -> Result<()> {
    match snapshot {
        Some(c) if c.id != id => Err(Error::Storage(format!(
            "snapshot for character {} cannot be stored under id {}",
            c.id, id
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn sort_newest_first(records: &mut [FavoriteRecord]) {
    records.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(b.id.cmp(&a.id)));
}
