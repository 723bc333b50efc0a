//! Paginated stream controller.
//!
//! A [`PagingController`] runs as one tokio task that owns the current
//! [`QueryState`] and the pages loaded for it. The UI shell drives it
//! through a [`PagingHandle`] and observes it through a `watch` channel of
//! [`PagingSnapshot`]s, which replays the latest snapshot to late
//! subscribers.
//!
//! # Sessions
//!
//! Every settled `(search_term, view_mode)` pair starts a new session with
//! a fresh generation number. Starting a session aborts every in-flight
//! load of the previous one, and any result that still arrives tagged with
//! an older generation is dropped, so a superseded query never reaches the
//! consumer.
//!
//! ```text
//!  set_search_term ──▶ debounce ──▶ (term changed?) ──┐
//!  set_view_mode ─────────────────────────────────────┼──▶ new session (gen + 1)
//!  refresh(anchor) ───────────────────────────────────┘        │
//!                                                              ▼
//!                          All: page loads via Catalog + favorite overlay
//!                          FavoritesOnly: one final page from the favorites view
//! ```
//!
//! # Loading
//!
//! The first page of a session loads on its own. Further pages are pulled
//! with [`PagingHandle::load_next`], one at a time, so pages arrive in
//! increasing page order. A failed load leaves earlier pages in place and
//! parks the session in [`LoadStatus::LoadError`] until
//! [`PagingHandle::retry`] reissues the same page.
//!
//! # Favorite changes
//!
//! When the favorite signal changes, loaded pages are re-merged from their
//! raw pages against a fresh read of the favorite ids. No page is
//! refetched. In favorites mode the single page is rebuilt.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use rickdex_core::models::{CatalogPage, CharacterItem, Page, QueryState, ViewMode};
use rickdex_core::paging::{merge_page, refresh_key, FIRST_PAGE};

use crate::catalog::Catalog;
use crate::error::{LoadError, Result};
use crate::favorites_view::favorites_page;
use crate::store::FavoriteStore;

/// Load state of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LoadStatus {
    Idle,
    Loading { page: u32 },
    Loaded { end_reached: bool },
    LoadError { page: u32, error: LoadError },
}

/// What the consumer renders.
#[derive(Debug, Clone, Serialize)]
pub struct PagingSnapshot {
    /// Session number; changes whenever a new query starts.
    pub generation: u64,
    pub query: QueryState,
    pub pages: Vec<Page<CharacterItem>>,
    pub status: LoadStatus,
    /// A search-term change is waiting out the debounce window.
    pub searching: bool,
}

impl PagingSnapshot {
    fn initial(query: QueryState) -> Self {
        Self {
            generation: 0,
            query,
            pages: Vec::new(),
            status: LoadStatus::Idle,
            searching: false,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &CharacterItem> {
        self.pages.iter().flat_map(|p| p.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|p| p.items.len()).sum()
    }

    pub fn end_reached(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded { end_reached: true })
    }

    pub fn error(&self) -> Option<&LoadError> {
        match &self.status {
            LoadStatus::LoadError { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Collaborators a paging session reads from.
#[derive(Clone)]
pub struct PagingDeps {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn FavoriteStore>,
    pub favorite_changes: watch::Receiver<u64>,
}

#[derive(Debug)]
enum Command {
    SetSearchTerm(String),
    SetViewMode(ViewMode),
    LoadNext,
    Retry,
    Refresh(Option<usize>),
}

/// Handle to a running [`PagingController`]. Dropping it stops the
/// controller and aborts its in-flight loads.
pub struct PagingHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<PagingSnapshot>,
    task: JoinHandle<()>,
}

impl PagingHandle {
    /// Record a new search term. Takes effect after the debounce window,
    /// and only if the term actually changed.
    pub fn set_search_term(&self, term: impl Into<String>) {
        self.send(Command::SetSearchTerm(term.into()));
    }

    /// Switch view mode. Takes effect immediately.
    pub fn set_view_mode(&self, mode: ViewMode) {
        self.send(Command::SetViewMode(mode));
    }

    /// Load the page after the last loaded one, if any.
    pub fn load_next(&self) {
        self.send(Command::LoadNext);
    }

    /// Reissue the load that failed.
    pub fn retry(&self) {
        self.send(Command::Retry);
    }

    /// Restart the current query near `anchor`, an item index in the
    /// flattened list. `None` restarts at the first page.
    pub fn refresh(&self, anchor: Option<usize>) {
        self.send(Command::Refresh(anchor));
    }

    pub fn subscribe(&self) -> watch::Receiver<PagingSnapshot> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> PagingSnapshot {
        self.snapshots.borrow().clone()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("paging controller has stopped; command ignored");
        }
    }
}

impl Drop for PagingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

type FetchedPage = (CatalogPage, HashSet<i64>);

enum TaskKind {
    Append { page: u32, result: Result<FetchedPage> },
    Favorites { result: Result<Page<CharacterItem>> },
    Overlay { result: Result<HashSet<i64>> },
}

struct TaskOutput {
    generation: u64,
    revision: u64,
    kind: TaskKind,
}

pub struct PagingController {
    deps: PagingDeps,
    debounce: Duration,
    query: QueryState,
    pending_term: Option<(String, Instant)>,
    generation: u64,
    next_revision: u64,
    applied_revision: u64,
    raw_pages: Vec<CatalogPage>,
    pages: Vec<Page<CharacterItem>>,
    status: LoadStatus,
    in_flight: JoinSet<TaskOutput>,
    tx: watch::Sender<PagingSnapshot>,
}

impl PagingController {
    /// Start a controller on the current tokio runtime and load the first
    /// page of `initial`.
    pub fn spawn(deps: PagingDeps, initial: QueryState, debounce: Duration) -> PagingHandle {
        let (tx, snapshots) = watch::channel(PagingSnapshot::initial(initial.clone()));
        let (commands, rx) = mpsc::unbounded_channel();

        let controller = PagingController {
            deps,
            debounce,
            query: initial,
            pending_term: None,
            generation: 0,
            next_revision: 0,
            applied_revision: 0,
            raw_pages: Vec::new(),
            pages: Vec::new(),
            status: LoadStatus::Idle,
            in_flight: JoinSet::new(),
            tx,
        };
        let task = tokio::spawn(controller.run(rx));

        PagingHandle {
            commands,
            snapshots,
            task,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut favorite_changes = self.deps.favorite_changes.clone();
        favorite_changes.borrow_and_update();
        let mut signal_open = true;

        self.start_session(FIRST_PAGE);

        loop {
            let deadline = self
                .pending_term
                .as_ref()
                .map(|(_, at)| *at)
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline), if self.pending_term.is_some() => {
                    self.settle_search_term();
                }
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.on_task_done(joined);
                }
                changed = favorite_changes.changed(), if signal_open => match changed {
                    Ok(()) => self.on_favorites_changed(),
                    Err(_) => signal_open = false,
                },
            }
        }

        debug!(generation = self.generation, "paging controller stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetSearchTerm(term) => {
                self.pending_term = Some((term, Instant::now() + self.debounce));
                self.publish();
            }
            Command::SetViewMode(mode) => {
                if mode != self.query.view_mode {
                    self.query.view_mode = mode;
                    self.start_session(FIRST_PAGE);
                }
            }
            Command::LoadNext => self.load_next(),
            Command::Retry => self.retry(),
            Command::Refresh(anchor) => {
                let key = match self.query.view_mode {
                    ViewMode::All => refresh_key(&self.pages, anchor),
                    ViewMode::FavoritesOnly => FIRST_PAGE,
                };
                self.start_session(key);
            }
        }
    }

    fn settle_search_term(&mut self) {
        let Some((term, _)) = self.pending_term.take() else {
            return;
        };
        let previous = self.query.effective_term().map(str::to_string);
        self.query.search_term = term;
        if self.query.effective_term().map(str::to_string) == previous {
            debug!("search term unchanged after debounce");
            self.publish();
            return;
        }
        self.start_session(FIRST_PAGE);
    }

    fn start_session(&mut self, first_page: u32) {
        self.in_flight.abort_all();
        self.generation += 1;
        self.raw_pages.clear();
        self.pages.clear();
        info!(
            generation = self.generation,
            term = self.query.effective_term().unwrap_or(""),
            mode = ?self.query.view_mode,
            first_page,
            "starting paging session"
        );

        match self.query.view_mode {
            ViewMode::All => self.spawn_append(first_page),
            ViewMode::FavoritesOnly => self.spawn_favorites(),
        }
        self.publish();
    }

    fn load_next(&mut self) {
        if self.query.view_mode == ViewMode::FavoritesOnly {
            return;
        }
        if !matches!(self.status, LoadStatus::Loaded { end_reached: false }) {
            return;
        }
        if let Some(next) = self.pages.last().and_then(|p| p.next_key) {
            self.spawn_append(next);
            self.publish();
        }
    }

    fn retry(&mut self) {
        let LoadStatus::LoadError { page, .. } = self.status else {
            return;
        };
        match self.query.view_mode {
            ViewMode::All => self.spawn_append(page),
            ViewMode::FavoritesOnly => self.spawn_favorites(),
        }
        self.publish();
    }

    fn take_revision(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    fn spawn_append(&mut self, page: u32) {
        self.status = LoadStatus::Loading { page };
        let catalog = Arc::clone(&self.deps.catalog);
        let store = Arc::clone(&self.deps.store);
        let term = self.query.effective_term().map(str::to_string);
        let generation = self.generation;
        let revision = self.take_revision();

        self.in_flight.spawn(async move {
            let result = fetch_and_lookup(&catalog, &*store, page, term.as_deref()).await;
            TaskOutput {
                generation,
                revision,
                kind: TaskKind::Append { page, result },
            }
        });
    }

    fn spawn_favorites(&mut self) {
        if self.pages.is_empty() {
            self.status = LoadStatus::Loading { page: FIRST_PAGE };
        }
        let catalog = Arc::clone(&self.deps.catalog);
        let store = Arc::clone(&self.deps.store);
        let term = self.query.effective_term().map(str::to_string);
        let generation = self.generation;
        let revision = self.take_revision();

        self.in_flight.spawn(async move {
            let result = favorites_page(&*store, &catalog, term.as_deref()).await;
            TaskOutput {
                generation,
                revision,
                kind: TaskKind::Favorites { result },
            }
        });
    }

    fn spawn_overlay(&mut self) {
        let store = Arc::clone(&self.deps.store);
        let generation = self.generation;
        let revision = self.take_revision();

        self.in_flight.spawn(async move {
            let result = store
                .favorite_ids()
                .await
                .map(|ids| ids.into_iter().collect());
            TaskOutput {
                generation,
                revision,
                kind: TaskKind::Overlay { result },
            }
        });
    }

    fn on_favorites_changed(&mut self) {
        match self.query.view_mode {
            ViewMode::All => self.spawn_overlay(),
            ViewMode::FavoritesOnly => self.spawn_favorites(),
        }
    }

    fn on_task_done(&mut self, joined: std::result::Result<TaskOutput, JoinError>) {
        let output = match joined {
            Ok(output) => output,
            Err(e) if e.is_cancelled() => return,
            Err(e) => {
                warn!(error = %e, "paging task panicked");
                return;
            }
        };
        if output.generation != self.generation {
            debug!(
                stale = output.generation,
                current = self.generation,
                "dropping result of superseded session"
            );
            return;
        }

        match output.kind {
            TaskKind::Append { page, result } => {
                let stale_lookup = result.is_ok() && output.revision < self.applied_revision;
                self.apply_append(page, result);
                if stale_lookup {
                    // Favorites changed while this page was in flight.
                    self.spawn_overlay();
                }
            }
            TaskKind::Favorites { result } => {
                if output.revision < self.applied_revision {
                    return;
                }
                self.applied_revision = output.revision;
                match result {
                    Ok(page) => {
                        self.pages = vec![page];
                        self.status = LoadStatus::Loaded { end_reached: true };
                    }
                    Err(e) => {
                        warn!(error = %e, "favorites view failed to load");
                        self.status = LoadStatus::LoadError {
                            page: FIRST_PAGE,
                            error: LoadError::from(&e),
                        };
                    }
                }
            }
            TaskKind::Overlay { result } => {
                if output.revision < self.applied_revision {
                    return;
                }
                self.applied_revision = output.revision;
                match result {
                    Ok(favorites) => {
                        self.pages = self
                            .raw_pages
                            .iter()
                            .map(|raw| merge_page(raw, |id| favorites.contains(&id)))
                            .collect();
                    }
                    Err(e) => warn!(error = %e, "favorite overlay refresh failed"),
                }
            }
        }
        self.publish();
    }

    fn apply_append(&mut self, page: u32, result: Result<FetchedPage>) {
        match result {
            Ok((raw, favorites)) => {
                let merged = merge_page(&raw, |id| favorites.contains(&id));
                debug!(
                    page,
                    items = merged.items.len(),
                    next = ?merged.next_key,
                    "page loaded"
                );
                self.status = LoadStatus::Loaded {
                    end_reached: merged.is_last(),
                };
                self.raw_pages.push(raw);
                self.pages.push(merged);
            }
            Err(e) => {
                warn!(page, error = %e, "page load failed");
                self.status = LoadStatus::LoadError {
                    page,
                    error: LoadError::from(&e),
                };
            }
        }
    }

    fn publish(&self) {
        self.tx.send_replace(PagingSnapshot {
            generation: self.generation,
            query: self.query.clone(),
            pages: self.pages.clone(),
            status: self.status.clone(),
            searching: self.pending_term.is_some(),
        });
    }
}

/// Fetch one page and look up favorite status for each of its items.
///
/// A failed lookup counts as not favorite; it never fails the page.
async fn fetch_and_lookup(
    catalog: &Catalog,
    store: &dyn FavoriteStore,
    page: u32,
    term: Option<&str>,
) -> Result<FetchedPage> {
    let raw = catalog.fetch_page(page, term).await?;
    let mut favorites = HashSet::new();
    for c in &raw.results {
        match store.is_favorite(c.id).await {
            Ok(true) => {
                favorites.insert(c.id);
            }
            Ok(false) => {}
            Err(e) => warn!(id = c.id, error = %e, "favorite lookup failed, assuming not favorite"),
        }
    }
    Ok((raw, favorites))
}
