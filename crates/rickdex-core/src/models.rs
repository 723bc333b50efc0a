//! Core data models used throughout rickdex.
//!
//! [`Character`] is the remote catalog entity. It carries no favorite
//! state of its own; favorite status is attached at read time by the page
//! merger, producing a [`CharacterItem`]. [`FavoriteRecord`] is the locally
//! owned persisted row, optionally holding a denormalized snapshot of the
//! character for offline display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Alive,
    Dead,
    Unknown,
}

impl Status {
    /// Parse a wire or stored value. Matching is case-insensitive and
    /// anything unrecognised maps to [`Status::Unknown`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "alive" => Status::Alive,
            "dead" => Status::Dead,
            _ => Status::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Alive => "Alive",
            Status::Dead => "Dead",
            Status::Unknown => "Unknown",
        }
    }
}

/// Gender of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Genderless,
    Unknown,
}

impl Gender {
    /// Case-insensitive parse with an [`Gender::Unknown`] fallback.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            "genderless" => Gender::Genderless,
            _ => Gender::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Genderless => "Genderless",
            Gender::Unknown => "Unknown",
        }
    }
}

/// A catalog entity as returned by the remote source.
///
/// Immutable once constructed. The id is stable and globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub status: Status,
    pub species: String,
    /// Subtype; often empty on the wire.
    #[serde(rename = "type")]
    pub kind: String,
    pub gender: Gender,
    pub origin: String,
    pub origin_url: Option<String>,
    pub location: String,
    pub location_url: Option<String>,
    pub image: String,
    /// Episode URLs, in server order.
    pub episodes: Vec<String>,
    pub url: String,
    pub created: String,
}

/// A character with its favorite status attached.
///
/// `is_favorite` is only valid for the render pass it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterItem {
    pub character: Character,
    pub is_favorite: bool,
}

impl CharacterItem {
    pub fn new(character: Character, is_favorite: bool) -> Self {
        Self {
            character,
            is_favorite,
        }
    }

    pub fn id(&self) -> i64 {
        self.character.id
    }
}

/// A parsed episode reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeRef {
    pub id: i64,
    pub url: String,
}

impl EpisodeRef {
    /// Parse the numeric id from the last path segment of an episode URL.
    ///
    /// Returns `None` when the URL has no numeric tail.
    pub fn from_url(url: &str) -> Option<Self> {
        let tail = url.trim_end_matches('/').rsplit('/').next()?;
        let id = tail.parse::<i64>().ok()?;
        Some(Self {
            id,
            url: url.to_string(),
        })
    }
}

/// Single-item view of a character for detail display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterDetail {
    pub character: Character,
    pub episodes: Vec<EpisodeRef>,
    pub is_favorite: bool,
}

impl CharacterDetail {
    pub fn new(character: Character, is_favorite: bool) -> Self {
        let episodes = character
            .episodes
            .iter()
            .filter_map(|url| EpisodeRef::from_url(url))
            .collect();
        Self {
            character,
            episodes,
            is_favorite,
        }
    }

    /// Species for display; blank values show as `"Unknown"`.
    pub fn display_species(&self) -> &str {
        if self.character.species.trim().is_empty() {
            "Unknown"
        } else {
            &self.character.species
        }
    }

    /// Subtype for display; blank values show as `"-"`.
    pub fn display_type(&self) -> &str {
        if self.character.kind.trim().is_empty() {
            "-"
        } else {
            &self.character.kind
        }
    }
}

/// A persisted favorite.
///
/// `id` always equals the id of the favorited character. `snapshot` is the
/// denormalized character captured when the favorite was added; it is
/// absent for id-only records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteRecord {
    pub id: i64,
    pub snapshot: Option<Character>,
    /// Unix milliseconds. Sort key, most recent first.
    pub added_at: i64,
}

impl FavoriteRecord {
    pub fn added_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.added_at)
    }
}

/// One raw page from the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPage {
    /// The 1-indexed page number this page was fetched at.
    pub page: u32,
    pub results: Vec<Character>,
    /// Whether the server signalled that more results exist.
    pub has_next: bool,
    /// Total result count reported by the server, if any.
    pub total_count: Option<u32>,
    /// Total page count reported by the server, if any.
    pub total_pages: Option<u32>,
}

/// An ordered page of items with its neighbouring page keys.
///
/// A `next_key` of `None` marks the last page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub prev_key: Option<u32>,
    pub next_key: Option<u32>,
}

impl<T> Page<T> {
    /// A single, final, non-paginated page.
    pub fn single(items: Vec<T>) -> Self {
        Self {
            items,
            prev_key: None,
            next_key: None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_key.is_none()
    }
}

/// Which collection the list view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewMode {
    /// Full remote catalog, paginated.
    #[default]
    All,
    /// Local favorites set, unpaginated.
    FavoritesOnly,
}

/// The query the list view is currently showing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct QueryState {
    pub search_term: String,
    pub view_mode: ViewMode,
}

impl QueryState {
    pub fn new(search_term: impl Into<String>, view_mode: ViewMode) -> Self {
        Self {
            search_term: search_term.into(),
            view_mode,
        }
    }

    /// The search term to send, or `None` when it is blank.
    pub fn effective_term(&self) -> Option<&str> {
        let trimmed = self.search_term.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}
