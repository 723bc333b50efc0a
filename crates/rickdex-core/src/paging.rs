//! Page merging and page-key derivation.
//!
//! A raw [`CatalogPage`] is merged with the current favorite state into a
//! [`Page<CharacterItem>`]. Merging is pure: the favorite state is passed
//! in as a lookup function and the raw page is never modified, so the same
//! raw page can be re-overlaid whenever favorites change.
//!
//! # Keys
//!
//! Page keys are 1-indexed page numbers. For a page fetched at `p`:
//!
//! - `prev_key = p - 1` when `p > 1`, otherwise `None`
//! - `next_key = p + 1` when the server signalled more results, otherwise `None`
//!
//! # Refresh key
//!
//! When a consumer restarts pagination from a position inside an already
//! loaded window, [`refresh_key`] picks the page closest to the anchor and
//! returns `prev_key + 1`, falling back to `next_key - 1`, falling back to 1.

use crate::models::{CatalogPage, CharacterItem, Page};

/// The first page number.
pub const FIRST_PAGE: u32 = 1;

pub fn prev_key(page: u32) -> Option<u32> {
    if page > FIRST_PAGE {
        Some(page - 1)
    } else {
        None
    }
}

pub fn next_key(page: u32, has_next: bool) -> Option<u32> {
    if has_next {
        page.checked_add(1)
    } else {
        None
    }
}

/// Overlay favorite state onto a raw page.
///
/// `is_favorite` is consulted once per item. Callers that cannot determine
/// the state for an id should answer `false` rather than fail the page.
pub fn merge_page<F>(raw: &CatalogPage, is_favorite: F) -> Page<CharacterItem>
where
    F: Fn(i64) -> bool,
{
    let items = raw
        .results
        .iter()
        .map(|c| CharacterItem::new(c.clone(), is_favorite(c.id)))
        .collect();

    Page {
        items,
        prev_key: prev_key(raw.page),
        next_key: next_key(raw.page, raw.has_next),
    }
}

/// Index of the loaded page closest to `anchor`, an item position in the
/// flattened window. Positions past either end clamp to the first or last
/// page.
pub fn closest_page_to_position<T>(pages: &[Page<T>], anchor: usize) -> Option<usize> {
    if pages.is_empty() {
        return None;
    }
    let mut start = 0usize;
    for (index, page) in pages.iter().enumerate() {
        let end = start + page.items.len();
        if anchor < end {
            return Some(index);
        }
        start = end;
    }
    Some(pages.len() - 1)
}

/// Page number to restart pagination from, keeping the consumer near
/// `anchor`.
pub fn refresh_key<T>(pages: &[Page<T>], anchor: Option<usize>) -> u32 {
    let Some(anchor) = anchor else {
        return FIRST_PAGE;
    };
    let Some(index) = closest_page_to_position(pages, anchor) else {
        return FIRST_PAGE;
    };
    let page = &pages[index];
    page.prev_key
        .map(|k| k + 1)
        .or_else(|| page.next_key.map(|k| k - 1))
        .unwrap_or(FIRST_PAGE)
}
