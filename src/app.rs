//! The surface a UI shell talks to.
//!
//! [`Rickdex`] wires the favorite store, the catalog client and cache, the
//! toggle coordinator and the favorite-changed signal together, and hands
//! out paging sessions that share them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;

use rickdex_core::models::{CharacterDetail, CharacterItem, FavoriteRecord, QueryState};

use crate::catalog::Catalog;
use crate::client::{CatalogClient, HttpCatalogClient};
use crate::config::Config;
use crate::db;
use crate::error;
use crate::favorites_view::build_favorites_view;
use crate::migrate;
use crate::pager::{PagingController, PagingDeps, PagingHandle};
use crate::sqlite_store::SqliteFavoriteStore;
use crate::store::{FavoriteStore, Toggled};
use crate::toggle::{FavoriteSignal, ToggleCoordinator};

pub struct Rickdex {
    store: Arc<dyn FavoriteStore>,
    catalog: Arc<Catalog>,
    toggles: ToggleCoordinator,
    signal: FavoriteSignal,
    debounce: Duration,
}

impl Rickdex {
    /// Open the configured database, apply migrations and connect the
    /// HTTP catalog client.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::run_migrations(&pool).await?;
        let store = SqliteFavoriteStore::open(pool).await?;
        let client = HttpCatalogClient::new(&config.api)?;
        Ok(Self::with_parts(Arc::new(store), Arc::new(client), config))
    }

    /// Assemble from existing parts (alternate stores, fake clients).
    pub fn with_parts(
        store: Arc<dyn FavoriteStore>,
        client: Arc<dyn CatalogClient>,
        config: &Config,
    ) -> Self {
        let catalog = Arc::new(Catalog::new(client, &config.cache));
        let signal = FavoriteSignal::new();
        let toggles = ToggleCoordinator::new(Arc::clone(&store), Arc::clone(&catalog), signal.clone());
        Self {
            store,
            catalog,
            toggles,
            signal,
            debounce: config.paging.debounce(),
        }
    }

    /// Start a paging session for `initial`.
    pub fn pages(&self, initial: QueryState) -> PagingHandle {
        let deps = PagingDeps {
            catalog: Arc::clone(&self.catalog),
            store: Arc::clone(&self.store),
            favorite_changes: self.signal.subscribe(),
        };
        PagingController::spawn(deps, initial, self.debounce)
    }

    /// Bumped after every applied toggle.
    pub fn favorites_changed(&self) -> watch::Receiver<u64> {
        self.signal.subscribe()
    }

    /// Live favorites, most recently added first.
    pub fn favorites_stream(&self) -> watch::Receiver<Vec<FavoriteRecord>> {
        self.store.subscribe()
    }

    pub async fn toggle_favorite(&self, id: i64) -> error::Result<Toggled> {
        self.toggles.toggle_favorite(id).await
    }

    pub async fn fetch_detail(&self, id: i64) -> error::Result<CharacterDetail> {
        self.catalog.fetch_detail(id, &*self.store).await
    }

    /// The favorites list outside of any paging session.
    pub async fn favorites_view(&self, search: Option<&str>) -> error::Result<Vec<CharacterItem>> {
        build_favorites_view(&*self.store, &self.catalog, search).await
    }

    pub async fn is_favorite(&self, id: i64) -> error::Result<bool> {
        self.store.is_favorite(id).await
    }
}
