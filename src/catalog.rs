//! Read-through entity cache in front of the [`CatalogClient`].
//!
//! Characters are ephemeral: they are never persisted, but every page load
//! and detail fetch leaves them in a bounded, time-limited `moka` cache so
//! that detail views and favorite toggles started from a list do not need
//! another round-trip.
//!
//! Favorite status is never cached here. [`Catalog::fetch_detail`] joins it
//! from the [`FavoriteStore`] at call time.

use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, warn};

use rickdex_core::models::{CatalogPage, Character, CharacterDetail};

use crate::client::CatalogClient;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::store::FavoriteStore;

pub struct Catalog {
    client: Arc<dyn CatalogClient>,
    entities: Cache<i64, Character>,
}

impl Catalog {
    pub fn new(client: Arc<dyn CatalogClient>, config: &CacheConfig) -> Self {
        Self {
            client,
            entities: Cache::builder()
                .max_capacity(config.detail_capacity)
                .time_to_live(config.ttl())
                .build(),
        }
    }

    /// Fetch a page and remember its characters.
    pub async fn fetch_page(&self, page: u32, search: Option<&str>) -> Result<CatalogPage> {
        let raw = self.client.fetch_page(page, search).await?;
        for c in &raw.results {
            self.entities.insert(c.id, c.clone()).await;
        }
        Ok(raw)
    }

    /// A character from the cache, or from the network on a miss.
    pub async fn character(&self, id: i64) -> Result<Character> {
        if let Some(hit) = self.entities.get(&id).await {
            debug!(id, "character cache hit");
            return Ok(hit);
        }
        let fresh = self.client.fetch_character(id).await?;
        self.entities.insert(id, fresh.clone()).await;
        Ok(fresh)
    }

    /// Detail view of a character with its current favorite status.
    ///
    /// A failing favorite lookup reports `false` rather than failing the
    /// detail.
    pub async fn fetch_detail(&self, id: i64, store: &dyn FavoriteStore) -> Result<CharacterDetail> {
        let character = self.character(id).await?;
        let is_favorite = match store.is_favorite(id).await {
            Ok(fav) => fav,
            Err(e) => {
                warn!(id, error = %e, "favorite lookup failed, assuming not favorite");
                false
            }
        };
        Ok(CharacterDetail::new(character, is_favorite))
    }
}
