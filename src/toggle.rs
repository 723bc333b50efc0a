//! Favorite toggling and the "favorite state changed" signal.
//!
//! [`ToggleCoordinator::toggle_favorite`] is the only path that mutates
//! favorites. It resolves a snapshot when adding (from the entity cache,
//! else the network), applies the toggle, then bumps the
//! [`FavoriteSignal`] so paging sessions re-overlay favorite state.
//!
//! A toggle runs on its own task: once started it completes (store update
//! and signal) even if the caller stops waiting for it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::store::{FavoriteStore, Toggled};

/// Monotonic counter bumped after every applied toggle.
///
/// Receivers only care that it changed; the value is a revision number.
#[derive(Clone)]
pub struct FavoriteSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl FavoriteSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn notify(&self) {
        self.tx.send_modify(|rev| *rev += 1);
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

impl Default for FavoriteSignal {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ToggleCoordinator {
    store: Arc<dyn FavoriteStore>,
    catalog: Arc<Catalog>,
    signal: FavoriteSignal,
}

impl ToggleCoordinator {
    pub fn new(store: Arc<dyn FavoriteStore>, catalog: Arc<Catalog>, signal: FavoriteSignal) -> Self {
        Self {
            store,
            catalog,
            signal,
        }
    }

    /// Flip the favorite state of `id`.
    ///
    /// On error the store is left untouched and no signal is emitted.
    pub async fn toggle_favorite(&self, id: i64) -> Result<Toggled> {
        let store = Arc::clone(&self.store);
        let catalog = Arc::clone(&self.catalog);
        let signal = self.signal.clone();

        tokio::spawn(async move { apply_toggle(&*store, &catalog, &signal, id).await })
            .await
            .map_err(|e| Error::Storage(format!("toggle of character {} did not complete: {}", id, e)))?
    }
}

async fn apply_toggle(
    store: &dyn FavoriteStore,
    catalog: &Catalog,
    signal: &FavoriteSignal,
    id: i64,
) -> Result<Toggled> {
    // Removing needs no snapshot, so unfavoriting works offline.
    let snapshot = if store.is_favorite(id).await? {
        None
    } else {
        Some(catalog.character(id).await?)
    };

    let outcome = store.toggle(id, snapshot.as_ref()).await?;
    signal.notify();
    info!(id, favorite = outcome.is_favorite(), "favorite toggled");
    Ok(outcome)
}
