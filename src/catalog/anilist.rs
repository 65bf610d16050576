//! AniList GraphQL catalog.

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{CacheStorage, MemoryStorage};
use crate::fetch::{
  ExecError, FetchOutcome, QueryExecutor, RemoteRequest, ResilientFetcher, RetryPolicy,
};

use super::api_types::{ApiEnvelope, ApiGenreData, ApiMediaData, ApiPageData, ApiScheduleData};
use super::queries;
use super::types::{AiringSlot, Anime, Genre};

pub const DEFAULT_ENDPOINT: &str = "https://graphql.anilist.co";

// ============================================================================
// Executor
// ============================================================================

/// Runs GraphQL documents against the AniList endpoint, one POST per call.
#[derive(Clone)]
pub struct AniListExecutor {
  http: Client,
  endpoint: Url,
}

impl AniListExecutor {
  pub fn new(http: Client, endpoint: Url) -> Self {
    Self { http, endpoint }
  }
}

impl QueryExecutor for AniListExecutor {
  async fn execute(&self, request: &RemoteRequest) -> Result<Value, ExecError> {
    let body = json!({
      "query": request.query(),
      "variables": request.params(),
    });

    let response = self
      .http
      .post(self.endpoint.clone())
      .header(ACCEPT, "application/json")
      .json(&body)
      .send()
      .await
      .map_err(|e| ExecError::Transport(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
      return Err(ExecError::NotFound);
    }
    if !status.is_success() {
      return Err(ExecError::Status(status.as_u16()));
    }

    let payload: Value = response
      .json()
      .await
      .map_err(|e| ExecError::Malformed(e.to_string()))?;

    check_graphql_errors(payload)
  }
}

/// Turn a payload carrying GraphQL `errors` into a rejection.
fn check_graphql_errors(payload: Value) -> Result<Value, ExecError> {
  let messages: Vec<String> = match payload.get("errors").and_then(Value::as_array) {
    Some(errors) if !errors.is_empty() => errors
      .iter()
      .map(|e| {
        e.get("message")
          .and_then(Value::as_str)
          .unwrap_or("unknown error")
          .to_string()
      })
      .collect(),
    _ => return Ok(payload),
  };
  Err(ExecError::Rejected(messages.join("; ")))
}

// ============================================================================
// Client
// ============================================================================

/// Default retry behaviour for AniList: two attempts, 2s apart, 10s each.
pub fn default_policy() -> RetryPolicy {
  RetryPolicy::new(2, Duration::from_secs(2), Duration::from_secs(10))
}

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Typed AniList operations on top of a `ResilientFetcher`.
pub struct AniListClient<E = AniListExecutor, S = MemoryStorage> {
  fetcher: ResilientFetcher<E, S>,
}

impl<E, S> Clone for AniListClient<E, S> {
  fn clone(&self) -> Self {
    Self {
      fetcher: self.fetcher.clone(),
    }
  }
}

impl<E: QueryExecutor, S: CacheStorage> AniListClient<E, S> {
  pub fn new(fetcher: ResilientFetcher<E, S>) -> Self {
    Self { fetcher }
  }

  pub fn fetcher(&self) -> &ResilientFetcher<E, S> {
    &self.fetcher
  }

  /// Fetch `request` and decode the `data` member of the response.
  async fn query<T: DeserializeOwned>(&self, request: RemoteRequest) -> FetchOutcome<T> {
    let operation = request.operation();
    self
      .fetcher
      .fetch(&request)
      .await
      .and_then(|value| decode_data(operation, value))
  }

  async fn media_page(&self, request: RemoteRequest) -> FetchOutcome<Vec<Anime>> {
    self
      .query::<ApiPageData>(request)
      .await
      .and_then(|data| {
        data
          .page
          .and_then(|page| page.media)
          .map(|media| media.into_iter().map(Anime::from).collect::<Vec<_>>())
          .into()
      })
  }

  async fn single_media(&self, request: RemoteRequest) -> FetchOutcome<Anime> {
    self
      .query::<ApiMediaData>(request)
      .await
      .and_then(|data| data.media.map(Anime::from).into())
  }

  fn paged(operation: &'static str, query: &str, page: u32, per_page: u32) -> RemoteRequest {
    RemoteRequest::new(operation, query)
      .param("page", page)
      .param("perPage", per_page)
  }

  /// Search anime by title, most popular first.
  pub async fn search(&self, query: &str, page: u32, per_page: u32) -> FetchOutcome<Vec<Anime>> {
    let request = Self::paged("search", queries::SEARCH, page, per_page).param("search", query);
    self.media_page(request).await
  }

  /// Best match for a title, or `Empty` if the search found nothing.
  pub async fn search_first(&self, title: &str) -> FetchOutcome<Anime> {
    self
      .search(title, 1, 1)
      .await
      .and_then(|list| list.into_iter().next().into())
  }

  /// Currently airing anime, trending first.
  pub async fn trending(&self, page: u32, per_page: u32) -> FetchOutcome<Vec<Anime>> {
    let request = Self::paged("trending", queries::TRENDING, page, per_page);
    self.media_page(request).await
  }

  pub async fn popular(&self, page: u32, per_page: u32) -> FetchOutcome<Vec<Anime>> {
    let request = Self::paged("popular", queries::POPULAR, page, per_page);
    self.media_page(request).await
  }

  /// Anime that have not started airing yet.
  pub async fn upcoming(&self, page: u32, per_page: u32) -> FetchOutcome<Vec<Anime>> {
    let request = Self::paged("upcoming", queries::UPCOMING, page, per_page);
    self.media_page(request).await
  }

  /// Highest scored movies.
  pub async fn top_movies(&self, page: u32, per_page: u32) -> FetchOutcome<Vec<Anime>> {
    let request = Self::paged("top_movies", queries::TOP_MOVIES, page, per_page);
    self.media_page(request).await
  }

  pub async fn by_genre(&self, genre: &str, page: u32, per_page: u32) -> FetchOutcome<Vec<Anime>> {
    let request = Self::paged("by_genre", queries::BY_GENRE, page, per_page).param("genre", genre);
    self.media_page(request).await
  }

  pub async fn by_anilist_id(&self, id: u64) -> FetchOutcome<Anime> {
    let request = RemoteRequest::new("by_id", queries::BY_ID).param("id", id);
    self.single_media(request).await
  }

  pub async fn by_mal_id(&self, mal_id: u64) -> FetchOutcome<Anime> {
    let request = RemoteRequest::new("by_mal_id", queries::BY_MAL_ID).param("idMal", mal_id);
    self.single_media(request).await
  }

  /// Look up `id` as an AniList id, then as a MyAnimeList id.
  ///
  /// The MAL lookup runs whenever the first lookup did not succeed. When
  /// neither succeeds, a failure from either lookup wins over `Empty`.
  pub async fn anime(&self, id: u64) -> FetchOutcome<Anime> {
    let first = self.by_anilist_id(id).await;
    if first.is_success() {
      return first;
    }

    debug!(id, "not found by AniList id, trying MyAnimeList id");
    match (first, self.by_mal_id(id).await) {
      (_, found @ FetchOutcome::Success(_)) => found,
      (_, failed @ FetchOutcome::Failed(_)) => failed,
      (failed @ FetchOutcome::Failed(_), _) => failed,
      _ => {
        warn!(id, "no media found for id (tried AniList and MyAnimeList)");
        FetchOutcome::Empty
      }
    }
  }

  /// All genres, numbered by their position in the collection.
  pub async fn genres(&self) -> FetchOutcome<Vec<Genre>> {
    let request = RemoteRequest::new("genres", queries::GENRES);
    self.query::<ApiGenreData>(request).await.and_then(|data| {
      data
        .genres
        .map(|names| {
          names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Genre::new(index as u32, name))
            .collect::<Vec<_>>()
        })
        .into()
    })
  }

  /// Every scheduled episode of an anime, aired or not.
  pub async fn airing_schedule(&self, anime_id: u64) -> FetchOutcome<Vec<AiringSlot>> {
    let request =
      RemoteRequest::new("airing_schedule", queries::AIRING_SCHEDULE).param("animeId", anime_id);
    self.query::<ApiScheduleData>(request).await.and_then(|data| {
      data
        .media
        .and_then(|media| media.airing_schedule)
        .map(|schedule| {
          schedule
            .nodes
            .into_iter()
            .map(AiringSlot::from)
            .collect::<Vec<_>>()
        })
        .into()
    })
  }
}

/// Decode `{"data": T}`; a null `data` is `Empty`, an unexpected shape is `Failed`.
fn decode_data<T: DeserializeOwned>(operation: &str, value: Value) -> FetchOutcome<T> {
  match serde_json::from_value::<ApiEnvelope<T>>(value) {
    Ok(envelope) => envelope.data.into(),
    Err(e) => {
      warn!(operation, error = %e, "unexpected response shape");
      FetchOutcome::Failed(format!("malformed {} response: {}", operation, e))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;
  use std::sync::Mutex;

  /// Answers by operation name; records every request it sees.
  #[derive(Default)]
  struct FakeAniList {
    replies: HashMap<&'static str, Result<Value, ExecError>>,
    seen: Mutex<Vec<RemoteRequest>>,
  }

  impl FakeAniList {
    fn reply(mut self, operation: &'static str, reply: Result<Value, ExecError>) -> Self {
      self.replies.insert(operation, reply);
      self
    }

    fn operations(&self) -> Vec<&'static str> {
      self.seen.lock().unwrap().iter().map(|r| r.operation()).collect()
    }
  }

  impl QueryExecutor for FakeAniList {
    async fn execute(&self, request: &RemoteRequest) -> Result<Value, ExecError> {
      self.seen.lock().unwrap().push(request.clone());
      self
        .replies
        .get(request.operation())
        .cloned()
        .unwrap_or(Err(ExecError::NotFound))
    }
  }

  fn client(fake: FakeAniList) -> AniListClient<FakeAniList, MemoryStorage> {
    AniListClient::new(ResilientFetcher::new(
      fake,
      MemoryStorage::new(32),
      RetryPolicy::new(1, Duration::from_millis(1), Duration::from_secs(1)),
      DEFAULT_TTL,
    ))
  }

  fn media(id: u64, english: &str) -> Value {
    json!({"id": id, "title": {"english": english}, "episodes": 12, "status": "FINISHED"})
  }

  fn page(items: Vec<Value>) -> Value {
    json!({"data": {"Page": {"pageInfo": {"hasNextPage": false}, "media": items}}})
  }

  #[test]
  fn test_graphql_errors_are_rejections() {
    let payload = json!({"data": null, "errors": [{"message": "Not Found.", "status": 404}]});
    assert_eq!(
      check_graphql_errors(payload),
      Err(ExecError::Rejected("Not Found.".into()))
    );

    let ok = json!({"data": {"GenreCollection": []}, "errors": []});
    assert_eq!(check_graphql_errors(ok.clone()), Ok(ok));
  }

  #[tokio::test]
  async fn test_trending_sends_paging_variables() {
    let c = client(FakeAniList::default().reply("trending", Ok(page(vec![media(1, "A")]))));

    let list = c.trending(2, 12).await.into_option().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].display_title(), "A");

    let seen = c.fetcher().executor().seen.lock().unwrap().clone();
    assert_eq!(seen[0].params().get("page"), Some(&json!(2)));
    assert_eq!(seen[0].params().get("perPage"), Some(&json!(12)));
    assert!(seen[0].query().contains("TRENDING_DESC"));
  }

  #[tokio::test]
  async fn test_search_first_returns_first_match() {
    let c = client(
      FakeAniList::default().reply("search", Ok(page(vec![media(20, "Naruto"), media(21, "B")]))),
    );
    assert_eq!(c.search_first("naruto").await.into_option().unwrap().id, 20);
  }

  #[tokio::test]
  async fn test_search_first_empty_page_is_empty() {
    let c = client(FakeAniList::default().reply("search", Ok(page(vec![]))));
    assert!(c.search_first("zzz").await.is_empty());
  }

  #[tokio::test]
  async fn test_null_page_is_empty() {
    let c = client(FakeAniList::default().reply("popular", Ok(json!({"data": {"Page": null}}))));
    assert!(c.popular(1, 12).await.is_empty());
  }

  #[tokio::test]
  async fn test_unexpected_shape_is_failed() {
    let c = client(
      FakeAniList::default().reply("upcoming", Ok(json!({"data": {"Page": {"media": "nope"}}}))),
    );
    let outcome = c.upcoming(1, 12).await;
    assert!(outcome.failure().unwrap().starts_with("malformed upcoming response"));
  }

  #[tokio::test]
  async fn test_anime_prefers_anilist_id() {
    let c = client(FakeAniList::default().reply("by_id", Ok(json!({"data": {"Media": media(42, "X")}}))));

    let anime = c.anime(42).await.into_option().unwrap();
    assert_eq!(anime.id, 42);
    assert_eq!(c.fetcher().executor().operations(), vec!["by_id"]);
  }

  #[tokio::test]
  async fn test_anime_falls_back_to_mal_id() {
    let c = client(
      FakeAniList::default()
        .reply("by_id", Err(ExecError::NotFound))
        .reply("by_mal_id", Ok(json!({"data": {"Media": media(5114, "FMA")}}))),
    );

    let anime = c.anime(5114).await.into_option().unwrap();
    assert_eq!(anime.display_title(), "FMA");
    assert_eq!(c.fetcher().executor().operations(), vec!["by_id", "by_mal_id"]);
  }

  #[tokio::test]
  async fn test_anime_not_found_anywhere_is_empty() {
    let c = client(FakeAniList::default());
    assert!(c.anime(9999).await.is_empty());
  }

  #[tokio::test]
  async fn test_anime_failure_beats_empty() {
    let c = client(FakeAniList::default().reply("by_id", Err(ExecError::Status(500))));
    assert!(c.anime(1).await.is_failed());
  }

  #[tokio::test]
  async fn test_genres_numbered_by_position() {
    let c = client(FakeAniList::default().reply(
      "genres",
      Ok(json!({"data": {"GenreCollection": ["Action", "Adventure", "Comedy"]}})),
    ));

    let genres = c.genres().await.into_option().unwrap();
    assert_eq!(genres[0], Genre::new(0, "Action"));
    assert_eq!(genres[2], Genre::new(2, "Comedy"));
  }

  #[tokio::test]
  async fn test_airing_schedule() {
    let c = client(FakeAniList::default().reply(
      "airing_schedule",
      Ok(json!({"data": {"Media": {"id": 1, "airingSchedule": {"nodes": [
        {"episode": 1, "airingAt": 100, "timeUntilAiring": -50}
      ]}}}})),
    ));

    let slots = c.airing_schedule(1).await.into_option().unwrap();
    assert_eq!(slots[0].episode, 1);
    assert_eq!(slots[0].airing_at, 100);
  }

  #[tokio::test]
  async fn test_repeated_query_is_served_from_cache() {
    let c = client(FakeAniList::default().reply("by_genre", Ok(page(vec![media(1, "A")]))));

    c.by_genre("Action", 1, 20).await;
    c.by_genre("Action", 1, 20).await;
    c.by_genre("Drama", 1, 20).await;

    assert_eq!(
      c.fetcher().executor().operations(),
      vec!["by_genre", "by_genre"]
    );
  }
}
