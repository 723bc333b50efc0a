//! # rickdex Core
//!
//! Shared, runtime-free logic for rickdex: the character data model,
//! the page merger (favorite overlay plus page-key derivation) and the
//! favorites name filter.
//!
//! This crate contains no tokio, sqlx, network or filesystem code. Every
//! function here is pure so the paging rules can be tested without a
//! runtime and reused by any host.

pub mod filter;
pub mod models;
pub mod paging;

pub use models::{
    CatalogPage, Character, CharacterDetail, CharacterItem, EpisodeRef, FavoriteRecord, Gender,
    Page, QueryState, Status, ViewMode,
};
