//! # rickdex
//!
//! **A paginated character catalog with search and a local favorites set.**
//!
//! rickdex streams pages of characters from a remote REST catalog, overlays
//! locally persisted favorite status onto every item at read time, re-queries
//! live as the search term or view mode changes, and keeps an unpaginated
//! favorites view consistent with the same favorite store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────────┐
//! │ CatalogClient│──▶│  Catalog   │──▶│ PagingCtrl   │──▶ PagingSnapshot (watch)
//! │  (reqwest)   │   │ moka cache │   │ merge+keys   │
//! └──────────────┘   └─────┬──────┘   └──────▲───────┘
//!                          │                 │ favorite signal
//!                    ┌─────▼──────┐   ┌──────┴───────┐
//!                    │ Favorites  │◀──│   Toggle     │
//!                    │ Store (SQL)│   │ Coordinator  │
//!                    └────────────┘   └──────────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. A [`pager::PagingController`] settles a `(search_term, view_mode)`
//!    query (debounced) and starts a session.
//! 2. In `All` mode each page comes from the [`catalog::Catalog`], which
//!    caches the characters it sees, and is merged with favorite status
//!    by the pure merger in `rickdex_core::paging`.
//! 3. In `FavoritesOnly` mode the [`favorites_view`] builder supplies one
//!    final page from the favorite store.
//! 4. [`toggle::ToggleCoordinator`] mutates the store and bumps the
//!    favorite signal; live sessions re-overlay their loaded pages.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`logging`] | `tracing` subscriber setup for hosts |
//! | [`error`] | Typed error taxonomy |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Favorites schema (idempotent) |
//! | [`store`] | `FavoriteStore` trait and in-memory store |
//! | [`sqlite_store`] | SQLite favorite store |
//! | [`client`] | Remote catalog client over HTTP |
//! | [`catalog`] | Entity cache and detail lookup |
//! | [`favorites_view`] | Unpaginated, filtered favorites list |
//! | [`toggle`] | Toggle coordinator and favorite signal |
//! | [`pager`] | Paginated stream controller |
//! | [`app`] | `Rickdex` facade for UI shells |

pub mod app;
pub mod catalog;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod favorites_view;
pub mod logging;
pub mod migrate;
pub mod pager;
pub mod sqlite_store;
pub mod store;
pub mod toggle;

pub use app::Rickdex;
pub use error::{Error, ErrorKind, LoadError, Result};
pub use pager::{LoadStatus, PagingHandle, PagingSnapshot};
pub use rickdex_core::models;
pub use rickdex_core::paging;
pub use store::{FavoriteStore, Toggled};
