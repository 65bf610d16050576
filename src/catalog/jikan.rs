//! Jikan (MyAnimeList) REST catalog.

use chrono::{Datelike, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::cache::{CacheStorage, MemoryStorage};
use crate::fetch::{
  ExecError, FetchOutcome, QueryExecutor, RemoteRequest, ResilientFetcher, RetryPolicy,
};

use super::types::Genre;

pub const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4";

/// Default retry behaviour for Jikan: three attempts, 1s then 2s apart.
pub fn default_policy() -> RetryPolicy {
  RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(10))
}

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JikanImageSet {
  pub image_url: Option<String>,
  pub large_image_url: Option<String>,
  pub small_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JikanImages {
  pub jpg: Option<JikanImageSet>,
}

/// A named MyAnimeList entity (genre, studio).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JikanNamed {
  pub mal_id: u32,
  pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JikanAired {
  /// Human-readable airing range, e.g. "Apr 7, 2013 to Sep 29, 2013"
  pub string: Option<String>,
}

/// Anime as returned by Jikan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JikanAnime {
  pub mal_id: u64,
  #[serde(default)]
  pub title: String,
  pub title_english: Option<String>,
  pub title_japanese: Option<String>,
  #[serde(default)]
  pub images: JikanImages,
  pub score: Option<f64>,
  pub episodes: Option<u32>,
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub status: Option<String>,
  pub aired: Option<JikanAired>,
  pub season: Option<String>,
  pub year: Option<i32>,
  pub synopsis: Option<String>,
  pub rating: Option<String>,
  #[serde(default)]
  pub studios: Vec<JikanNamed>,
  #[serde(default)]
  pub genres: Vec<JikanNamed>,
  pub source: Option<String>,
}

impl JikanAnime {
  pub fn display_title(&self) -> &str {
    match self.title_english.as_deref() {
      Some(english) if !english.trim().is_empty() => english,
      _ => &self.title,
    }
  }

  pub fn image_url(&self) -> Option<&str> {
    self.images.jpg.as_ref()?.image_url.as_deref()
  }
}

#[derive(Debug, Deserialize)]
struct JikanList<T> {
  #[serde(default = "Vec::new")]
  data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct JikanSingle<T> {
  data: Option<T>,
}

// ============================================================================
// Executor
// ============================================================================

/// Runs REST requests against Jikan: the request query is the path, the
/// parameters become the query string.
#[derive(Clone)]
pub struct JikanExecutor {
  http: Client,
  base_url: Url,
}

impl JikanExecutor {
  pub fn new(http: Client, base_url: Url) -> Self {
    Self { http, base_url }
  }

  fn build_url(&self, request: &RemoteRequest) -> Result<Url, ExecError> {
    let raw = format!(
      "{}{}",
      self.base_url.as_str().trim_end_matches('/'),
      request.query()
    );
    let mut url =
      Url::parse(&raw).map_err(|e| ExecError::Rejected(format!("invalid url {}: {}", raw, e)))?;

    if !request.params().is_empty() {
      let mut pairs = url.query_pairs_mut();
      for (name, value) in request.params() {
        match value {
          Value::String(s) => pairs.append_pair(name, s),
          other => pairs.append_pair(name, &other.to_string()),
        };
      }
    }

    Ok(url)
  }
}

impl QueryExecutor for JikanExecutor {
  async fn execute(&self, request: &RemoteRequest) -> Result<Value, ExecError> {
    let url = self.build_url(request)?;

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| ExecError::Transport(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
      return Err(ExecError::NotFound);
    }
    if !status.is_success() {
      // 429 (rate limited) lands here and is retried like any server error
      return Err(ExecError::Status(status.as_u16()));
    }

    response
      .json()
      .await
      .map_err(|e| ExecError::Malformed(e.to_string()))
  }
}

// ============================================================================
// Client
// ============================================================================

/// Which top list to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopFilter {
  /// Top currently airing
  Airing,
  /// Most members
  Popular,
  /// Top movies
  Movies,
}

/// The season after the one containing `date`, named as Jikan expects.
pub fn next_season(date: NaiveDate) -> &'static str {
  match date.month() {
    1..=3 => "spring",
    4..=6 => "summer",
    7..=9 => "fall",
    _ => "winter",
  }
}

/// Genres used when the genre list cannot be fetched.
pub fn fallback_genres() -> Vec<Genre> {
  [
    (1, "Action"),
    (2, "Adventure"),
    (4, "Comedy"),
    (8, "Drama"),
    (10, "Fantasy"),
    (22, "Romance"),
    (23, "School"),
    (24, "Sci-Fi"),
    (27, "Shounen"),
    (30, "Sports"),
    (36, "Slice of Life"),
    (37, "Supernatural"),
  ]
  .into_iter()
  .map(|(id, name)| Genre::new(id, name))
  .collect()
}

/// Typed Jikan operations on top of a `ResilientFetcher`.
pub struct JikanClient<E = JikanExecutor, S = MemoryStorage> {
  fetcher: ResilientFetcher<E, S>,
}

impl<E, S> Clone for JikanClient<E, S> {
  fn clone(&self) -> Self {
    Self {
      fetcher: self.fetcher.clone(),
    }
  }
}

impl<E: QueryExecutor, S: CacheStorage> JikanClient<E, S> {
  pub fn new(fetcher: ResilientFetcher<E, S>) -> Self {
    Self { fetcher }
  }

  pub fn fetcher(&self) -> &ResilientFetcher<E, S> {
    &self.fetcher
  }

  async fn get<T: DeserializeOwned>(&self, request: RemoteRequest) -> FetchOutcome<T> {
    let operation = request.operation();
    self
      .fetcher
      .fetch(&request)
      .await
      .and_then(|value| match serde_json::from_value::<T>(value) {
        Ok(decoded) => FetchOutcome::Success(decoded),
        Err(e) => {
          warn!(operation, error = %e, "unexpected response shape");
          FetchOutcome::Failed(format!("malformed {} response: {}", operation, e))
        }
      })
  }

  async fn list(&self, request: RemoteRequest) -> FetchOutcome<Vec<JikanAnime>> {
    self
      .get::<JikanList<JikanAnime>>(request)
      .await
      .map(|list| list.data)
  }

  /// Search by title, most popular first.
  pub async fn search(&self, query: &str) -> FetchOutcome<Vec<JikanAnime>> {
    let request = RemoteRequest::new("jikan_search", "/anime")
      .param("q", query)
      .param("limit", 20)
      .param("order_by", "popularity");
    self.list(request).await
  }

  pub async fn anime(&self, mal_id: u64) -> FetchOutcome<JikanAnime> {
    let request = RemoteRequest::new("jikan_anime", format!("/anime/{}", mal_id));
    self
      .get::<JikanSingle<JikanAnime>>(request)
      .await
      .and_then(|single| single.data.into())
  }

  pub async fn top(&self, filter: TopFilter) -> FetchOutcome<Vec<JikanAnime>> {
    let request = RemoteRequest::new("jikan_top", "/top/anime");
    let request = match filter {
      TopFilter::Airing => request.param("filter", "airing"),
      TopFilter::Popular => request.param("filter", "bypopularity"),
      TopFilter::Movies => request.param("type", "movie"),
    };
    self.list(request.param("limit", 12)).await
  }

  /// Anime of the season following `today`.
  pub async fn upcoming(&self, today: NaiveDate) -> FetchOutcome<Vec<JikanAnime>> {
    let path = format!("/seasons/{}/{}", today.year(), next_season(today));
    let request = RemoteRequest::new("jikan_upcoming", path).param("limit", 12);
    self.list(request).await
  }

  pub async fn genres(&self) -> FetchOutcome<Vec<Genre>> {
    let request = RemoteRequest::new("jikan_genres", "/genres/anime");
    self
      .get::<JikanList<JikanNamed>>(request)
      .await
      .map(|list| {
        list
          .data
          .into_iter()
          .map(|g| Genre::new(g.mal_id, g.name))
          .collect()
      })
  }

  /// Genre list, or the built-in list when Jikan has nothing to offer.
  pub async fn genres_or_fallback(&self) -> Vec<Genre> {
    match self.genres().await {
      FetchOutcome::Success(genres) if !genres.is_empty() => genres,
      _ => fallback_genres(),
    }
  }

  pub async fn by_genre(&self, genre_id: u32) -> FetchOutcome<Vec<JikanAnime>> {
    let request = RemoteRequest::new("jikan_by_genre", "/anime")
      .param("genres", genre_id.to_string())
      .param("limit", 20)
      .param("order_by", "popularity");
    self.list(request).await
  }
}
