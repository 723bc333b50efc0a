//! Shared fixtures: an in-process fake [`CatalogClient`] and an `axum`
//! fake of the character REST API.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use rickdex::client::CatalogClient;
use rickdex::models::{CatalogPage, Character, Gender, Status};
use rickdex::{Error, PagingHandle, PagingSnapshot, Result};

pub const PAGE_SIZE: usize = 20;

pub fn make_character(id: i64, name: &str) -> Character {
    Character {
        id,
        name: name.to_string(),
        status: if id % 3 == 0 { Status::Dead } else { Status::Alive },
        species: "Human".to_string(),
        kind: String::new(),
        gender: if id % 2 == 0 { Gender::Male } else { Gender::Female },
        origin: "Earth (C-137)".to_string(),
        origin_url: Some("https://rickandmortyapi.com/api/location/1".to_string()),
        location: "Citadel of Ricks".to_string(),
        location_url: Some("https://rickandmortyapi.com/api/location/3".to_string()),
        image: format!("https://rickandmortyapi.com/api/character/avatar/{id}.jpeg"),
        episodes: vec![
            "https://rickandmortyapi.com/api/episode/1".to_string(),
            format!("https://rickandmortyapi.com/api/episode/{}", id + 1),
        ],
        url: format!("https://rickandmortyapi.com/api/character/{id}"),
        created: "2017-11-04T18:48:46.250Z".to_string(),
    }
}

/// `count` characters with ids `1..=count`. Names cycle through a few
/// families so name searches have something to find.
pub fn cast(count: i64) -> Vec<Character> {
    (1..=count)
        .map(|id| {
            let name = match id {
                1 => "Rick Sanchez".to_string(),
                2 => "Morty Smith".to_string(),
                3 => "Summer Smith".to_string(),
                14 => "Alien Morty".to_string(),
                _ if id % 5 == 0 => format!("Abcd Clone {id}"),
                _ => format!("Citizen {id}"),
            };
            make_character(id, &name)
        })
        .collect()
}

// ============ In-process fake client ============

/// Pages `PAGE_SIZE` characters at a time over a fixed cast, recording
/// every call.
pub struct FakeCatalog {
    characters: Vec<Character>,
    page_calls: Mutex<Vec<(u32, Option<String>)>>,
    detail_calls: Mutex<Vec<i64>>,
    fail_next_pages: AtomicUsize,
    offline: AtomicBool,
    delays: Mutex<HashMap<String, Duration>>,
    missing: Mutex<HashSet<i64>>,
}

impl FakeCatalog {
    pub fn new(characters: Vec<Character>) -> Self {
        Self {
            characters,
            page_calls: Mutex::new(Vec::new()),
            detail_calls: Mutex::new(Vec::new()),
            fail_next_pages: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
            delays: Mutex::new(HashMap::new()),
            missing: Mutex::new(HashSet::new()),
        }
    }

    pub fn page_calls(&self) -> Vec<(u32, Option<String>)> {
        self.page_calls.lock().unwrap().clone()
    }

    /// Page calls made with a search term, as `(page, term)`.
    pub fn searched(&self) -> Vec<(u32, String)> {
        self.page_calls()
            .into_iter()
            .filter_map(|(p, t)| t.map(|t| (p, t)))
            .collect()
    }

    pub fn detail_calls(&self) -> Vec<i64> {
        self.detail_calls.lock().unwrap().clone()
    }

    pub fn fail_next_pages(&self, n: usize) {
        self.fail_next_pages.store(n, Ordering::SeqCst);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn delay_term(&self, term: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(term.to_string(), delay);
    }

    pub fn remove(&self, id: i64) {
        self.missing.lock().unwrap().insert(id);
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn fetch_page(&self, page: u32, search: Option<&str>) -> Result<CatalogPage> {
        self.page_calls
            .lock()
            .unwrap()
            .push((page, search.map(str::to_string)));

        let delay = search.and_then(|t| self.delays.lock().unwrap().get(t).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("simulated offline".to_string()));
        }
        if self
            .fail_next_pages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Network("simulated connection reset".to_string()));
        }

        let term = search.map(str::to_lowercase);
        let matching: Vec<&Character> = self
            .characters
            .iter()
            .filter(|c| match &term {
                Some(t) => c.name.to_lowercase().contains(t),
                None => true,
            })
            .collect();
        let start = (page as usize - 1) * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(matching.len());
        let results = if start < end {
            matching[start..end].iter().map(|c| (*c).clone()).collect()
        } else {
            Vec::new()
        };

        Ok(CatalogPage {
            page,
            results,
            has_next: end < matching.len(),
            total_count: Some(matching.len() as u32),
            total_pages: Some(matching.len().div_ceil(PAGE_SIZE) as u32),
        })
    }

    async fn fetch_character(&self, id: i64) -> Result<Character> {
        self.detail_calls.lock().unwrap().push(id);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("simulated offline".to_string()));
        }
        if self.missing.lock().unwrap().contains(&id) {
            return Err(Error::NotFound(id));
        }
        self.characters
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(Error::NotFound(id))
    }
}

// ============ Paging helpers ============

/// Wait (in tokio time) until a snapshot satisfies `predicate`.
pub async fn wait_for<F>(handle: &PagingHandle, mut predicate: F) -> PagingSnapshot
where
    F: FnMut(&PagingSnapshot) -> bool,
{
    let mut rx = handle.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| predicate(s)))
        .await
        .expect("timed out waiting for paging snapshot")
        .expect("paging controller stopped")
        .clone();
    snapshot
}

pub fn ids(snapshot: &PagingSnapshot) -> Vec<i64> {
    snapshot.items().map(|i| i.id()).collect()
}

// ============ Fake HTTP API ============

pub struct FakeApi {
    characters: Vec<Value>,
    pub requests: Mutex<Vec<HashMap<String, String>>>,
}

fn character_json(c: &Character) -> Value {
    json!({
        "id": c.id,
        "name": c.name,
        "status": c.status.as_str(),
        "species": c.species,
        "type": c.kind,
        "gender": c.gender.as_str(),
        "origin": {"name": c.origin, "url": c.origin_url.clone().unwrap_or_default()},
        "location": {"name": c.location, "url": c.location_url.clone().unwrap_or_default()},
        "image": c.image,
        "episode": c.episodes,
        "url": c.url,
        "created": c.created,
    })
}

fn nothing_here() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "There is nothing here"})),
    )
        .into_response()
}

async fn list_characters(
    State(api): State<Arc<FakeApi>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    api.requests.lock().unwrap().push(params.clone());

    let name = params.get("name").map(|n| n.to_lowercase());
    match name.as_deref() {
        Some("boom") => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "upstream exploded"})),
            )
                .into_response()
        }
        Some("garbage") => return (StatusCode::OK, "<html>not json</html>").into_response(),
        _ => {}
    }

    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let matching: Vec<&Value> = api
        .characters
        .iter()
        .filter(|c| match &name {
            Some(n) => c["name"].as_str().unwrap_or("").to_lowercase().contains(n),
            None => true,
        })
        .collect();
    let pages = matching.len().div_ceil(PAGE_SIZE);
    if page == 0 || page > pages {
        return nothing_here();
    }

    let start = (page - 1) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(matching.len());
    let next = (page < pages).then(|| format!("http://fake/api/character?page={}", page + 1));
    let prev = (page > 1).then(|| format!("http://fake/api/character?page={}", page - 1));

    Json(json!({
        "info": {"count": matching.len(), "pages": pages, "next": next, "prev": prev},
        "results": matching[start..end],
    }))
    .into_response()
}

async fn get_character(State(api): State<Arc<FakeApi>>, Path(id): Path<i64>) -> Response {
    match id {
        666 => return (StatusCode::OK, Json(json!({"id": "not-a-number"}))).into_response(),
        777 => {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        _ => {}
    }
    match api.characters.iter().find(|c| c["id"] == json!(id)) {
        Some(c) => Json(c.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Character not found"})),
        )
            .into_response(),
    }
}

/// Serve the fake API on an ephemeral port. Returns the `/api/` base URL.
pub async fn spawn_fake_api(characters: &[Character]) -> (String, Arc<FakeApi>) {
    let api = Arc::new(FakeApi {
        characters: characters.iter().map(character_json).collect(),
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/api/character", get(list_characters))
        .route("/api/character/{id}", get(get_character))
        .with_state(Arc::clone(&api));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api/", addr), api)
}

/// A base URL nothing is listening on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/", addr)
}
