//! Remote catalog client.
//!
//! Defines the [`CatalogClient`] trait and [`HttpCatalogClient`], which talks
//! to the character REST API:
//!
//! - `GET {base}character?page={p}&name={term}` → `{ info, results }`
//! - `GET {base}character/{id}` → a single character
//!
//! # Error mapping
//!
//! - connect failure, timeout, body read failure → [`Error::Network`]
//! - non-2xx status or undecodable payload → [`Error::Protocol`]
//! - `404` on the single-character endpoint → [`Error::NotFound`]
//!
//! There is no retry here; retrying is the caller's policy.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use rickdex_core::models::{CatalogPage, Character, Gender, Status};

use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// A source of catalog pages and single characters.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one 1-indexed page, optionally filtered by name.
    async fn fetch_page(&self, page: u32, search: Option<&str>) -> Result<CatalogPage>;

    /// Fetch a single character by id.
    async fn fetch_character(&self, id: i64) -> Result<Character>;
}

// ============ Wire format ============

#[derive(Debug, Deserialize)]
struct CharactersResponseDto {
    info: Option<PageInfoDto>,
    results: Vec<CharacterDto>,
}

#[derive(Debug, Deserialize)]
struct PageInfoDto {
    count: Option<u32>,
    pages: Option<u32>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationRefDto {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct CharacterDto {
    id: i64,
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    species: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    gender: String,
    origin: Option<LocationRefDto>,
    location: Option<LocationRefDto>,
    #[serde(default)]
    image: String,
    #[serde(default)]
    episode: Vec<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    created: String,
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

impl From<CharacterDto> for Character {
    fn from(dto: CharacterDto) -> Self {
        let (origin, origin_url) = dto
            .origin
            .map(|o| (o.name, non_empty(o.url)))
            .unwrap_or_default();
        let (location, location_url) = dto
            .location
            .map(|l| (l.name, non_empty(l.url)))
            .unwrap_or_default();
        Character {
            id: dto.id,
            name: dto.name,
            status: Status::parse(&dto.status),
            species: dto.species,
            kind: dto.kind,
            gender: Gender::parse(&dto.gender),
            origin,
            origin_url,
            location,
            location_url,
            image: dto.image,
            episodes: dto.episode,
            url: dto.url,
            created: dto.created,
        }
    }
}

fn into_catalog_page(page: u32, dto: CharactersResponseDto) -> CatalogPage {
    let (has_next, total_count, total_pages) = match dto.info {
        Some(info) => (info.next.is_some(), info.count, info.pages),
        None => (false, None, None),
    };
    CatalogPage {
        page,
        results: dto.results.into_iter().map(Character::from).collect(),
        has_next,
        total_count,
        total_pages,
    }
}

// ============ HTTP client ============

/// [`CatalogClient`] over HTTP using `reqwest`.
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCatalogClient {
    /// Build a client from the `[api]` configuration.
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("rickdex/{}", env!("CARGO_PKG_VERSION")));

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::protocol(None, format!("invalid endpoint '{}': {}", path, e)))
    }
}

async fn error_body(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    // The API answers errors as {"error": "..."}.
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(text)
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_page(&self, page: u32, search: Option<&str>) -> Result<CatalogPage> {
        let mut url = self.endpoint("character")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &page.to_string());
            if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
                query.append_pair("name", term);
            }
        }
        debug!(%url, page, "fetching catalog page");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = error_body(response).await;
            return Err(Error::protocol(Some(status.as_u16()), message));
        }

        let body = response.bytes().await?;
        let dto: CharactersResponseDto = serde_json::from_slice(&body).map_err(|e| {
            Error::protocol(Some(status.as_u16()), format!("malformed page payload: {}", e))
        })?;
        Ok(into_catalog_page(page, dto))
    }

    async fn fetch_character(&self, id: i64) -> Result<Character> {
        let url = self.endpoint(&format!("character/{}", id))?;
        debug!(%url, id, "fetching character");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(id));
        }
        if !status.is_success() {
            let message = error_body(response).await;
            return Err(Error::protocol(Some(status.as_u16()), message));
        }

        let body = response.bytes().await?;
        let dto: CharacterDto = serde_json::from_slice(&body).map_err(|e| {
            Error::protocol(Some(status.as_u16()), format!("malformed character payload: {}", e))
        })?;
        Ok(dto.into())
    }
}
