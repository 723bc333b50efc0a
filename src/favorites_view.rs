//! Flat, unpaginated favorites list.
//!
//! Built from the [`FavoriteStore`] alone when every record carries a
//! snapshot; id-only records are resolved through the [`Catalog`]. A record
//! that cannot be resolved is left out of the view instead of failing it.

use tracing::warn;

use rickdex_core::filter::name_matches;
use rickdex_core::models::{CharacterItem, Page};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::store::FavoriteStore;

/// Favorites, most recently added first, optionally filtered by name.
///
/// Every returned item has `is_favorite == true`.
pub async fn build_favorites_view(
    store: &dyn FavoriteStore,
    catalog: &Catalog,
    search: Option<&str>,
) -> Result<Vec<CharacterItem>> {
    let records = store.favorites().await?;
    let term = search.map(str::trim).filter(|t| !t.is_empty());

    let mut items = Vec::with_capacity(records.len());
    for record in records {
        let character = match record.snapshot {
            Some(snapshot) => snapshot,
            None => match catalog.character(record.id).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(id = record.id, error = %e, "dropping unresolvable favorite from view");
                    continue;
                }
            },
        };
        if let Some(term) = term {
            if !name_matches(&character, term) {
                continue;
            }
        }
        items.push(CharacterItem::new(character, true));
    }
    Ok(items)
}

/// The favorites view as the single, final page of a paging session.
pub async fn favorites_page(
    store: &dyn FavoriteStore,
    catalog: &Catalog,
    search: Option<&str>,
) -> Result<Page<CharacterItem>> {
    Ok(Page::single(build_favorites_view(store, catalog, search).await?))
}
