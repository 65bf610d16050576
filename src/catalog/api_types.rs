//! Serde-deserializable types matching AniList GraphQL responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;

use super::types::{Anime, CoverImage, MediaStatus, NextAiring, Studio, Title};

// ============================================================================
// Envelope
// ============================================================================

/// `{"data": ...}` wrapper around every GraphQL response.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
  pub data: Option<T>,
}

// ============================================================================
// Media
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiTitle {
  pub romaji: Option<String>,
  pub english: Option<String>,
  pub native: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiCoverImage {
  pub large: Option<String>,
  pub extra_large: Option<String>,
  pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiStudioNode {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiStudioEdge {
  pub node: ApiStudioNode,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiStudios {
  #[serde(default)]
  pub edges: Vec<ApiStudioEdge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAiringEpisode {
  pub episode: u32,
  pub airing_at: i64,
  pub time_until_airing: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMedia {
  pub id: u64,
  pub id_mal: Option<u64>,
  pub title: Option<ApiTitle>,
  pub cover_image: Option<ApiCoverImage>,
  pub banner_image: Option<String>,
  pub description: Option<String>,
  pub average_score: Option<u32>,
  pub episodes: Option<u32>,
  pub format: Option<String>,
  pub status: Option<String>,
  pub season: Option<String>,
  pub season_year: Option<i32>,
  #[serde(default)]
  pub genres: Option<Vec<String>>,
  pub studios: Option<ApiStudios>,
  pub source: Option<String>,
  pub is_adult: Option<bool>,
  pub next_airing_episode: Option<ApiAiringEpisode>,
}

// ============================================================================
// Query payloads
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPageInfo {
  pub total: Option<u64>,
  pub current_page: Option<u32>,
  pub last_page: Option<u32>,
  #[serde(default)]
  pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPage {
  pub page_info: Option<ApiPageInfo>,
  pub media: Option<Vec<ApiMedia>>,
}

/// `data` of the paged media queries.
#[derive(Debug, Deserialize)]
pub struct ApiPageData {
  #[serde(rename = "Page")]
  pub page: Option<ApiPage>,
}

/// `data` of the single media queries.
#[derive(Debug, Deserialize)]
pub struct ApiMediaData {
  #[serde(rename = "Media")]
  pub media: Option<ApiMedia>,
}

/// `data` of the genre collection query.
#[derive(Debug, Deserialize)]
pub struct ApiGenreData {
  #[serde(rename = "GenreCollection")]
  pub genres: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiAiringSchedule {
  #[serde(default)]
  pub nodes: Vec<ApiAiringEpisode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiScheduleMedia {
  pub airing_schedule: Option<ApiAiringSchedule>,
}

/// `data` of the airing schedule query.
#[derive(Debug, Deserialize)]
pub struct ApiScheduleData {
  #[serde(rename = "Media")]
  pub media: Option<ApiScheduleMedia>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl From<ApiAiringEpisode> for NextAiring {
  fn from(api: ApiAiringEpisode) -> Self {
    NextAiring {
      episode: api.episode,
      airing_at: api.airing_at,
      time_until_airing: api.time_until_airing,
    }
  }
}

impl From<ApiMedia> for Anime {
  fn from(m: ApiMedia) -> Self {
    let title = m.title.unwrap_or_default();
    let cover = m.cover_image.unwrap_or_default();
    Anime {
      id: m.id,
      id_mal: m.id_mal,
      title: Title {
        romaji: title.romaji,
        english: title.english,
        native: title.native,
      },
      cover_image: CoverImage {
        large: cover.large,
        extra_large: cover.extra_large,
        color: cover.color,
      },
      banner_image: m.banner_image,
      description: m.description,
      average_score: m.average_score,
      episodes: m.episodes,
      format: m.format,
      status: m.status.map(MediaStatus::from),
      season: m.season,
      season_year: m.season_year,
      genres: m.genres.unwrap_or_default(),
      studios: m
        .studios
        .unwrap_or_default()
        .edges
        .into_iter()
        .map(|edge| Studio {
          id: edge.node.id,
          name: edge.node.name,
        })
        .collect(),
      source: m.source,
      is_adult: m.is_adult,
      next_airing_episode: m.next_airing_episode.map(NextAiring::from),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_media_maps_to_anime() {
    let media: ApiMedia = serde_json::from_value(json!({
      "id": 16498,
      "idMal": 16498,
      "title": {"romaji": "Shingeki no Kyojin", "english": "Attack on Titan", "native": null},
      "coverImage": {"large": "https://img/large.jpg", "extraLarge": null, "color": "#e4a15d"},
      "bannerImage": null,
      "description": "Several hundred years ago...",
      "averageScore": 85,
      "episodes": 25,
      "format": "TV",
      "status": "FINISHED",
      "season": "SPRING",
      "seasonYear": 2013,
      "genres": ["Action", "Drama"],
      "studios": {"edges": [{"node": {"id": 858, "name": "Wit Studio"}}]},
      "source": "MANGA",
      "isAdult": false,
      "nextAiringEpisode": null
    }))
    .unwrap();

    let anime = Anime::from(media);
    assert_eq!(anime.id, 16498);
    assert_eq!(anime.display_title(), "Attack on Titan");
    assert_eq!(anime.cover_image.color.as_deref(), Some("#e4a15d"));
    assert_eq!(anime.status, Some(MediaStatus::Finished));
    assert_eq!(anime.genres, vec!["Action", "Drama"]);
    assert_eq!(
      anime.studios,
      vec![Studio {
        id: 858,
        name: "Wit Studio".into()
      }]
    );
    assert!(anime.next_airing_episode.is_none());
  }

  #[test]
  fn test_sparse_media_uses_defaults() {
    let media: ApiMedia = serde_json::from_value(json!({"id": 1})).unwrap();
    let anime = Anime::from(media);
    assert_eq!(anime.display_title(), "Untitled");
    assert!(anime.genres.is_empty());
    assert!(anime.studios.is_empty());
    assert!(anime.image_url().is_none());
  }

  #[test]
  fn test_envelope_with_null_media() {
    let env: ApiEnvelope<ApiMediaData> =
      serde_json::from_value(json!({"data": {"Media": null}})).unwrap();
    assert!(env.data.unwrap().media.is_none());
  }

  #[test]
  fn test_schedule_payload() {
    let env: ApiEnvelope<ApiScheduleData> = serde_json::from_value(json!({
      "data": {"Media": {"id": 1, "airingSchedule": {"nodes": [
        {"episode": 1, "airingAt": 1700000000, "timeUntilAiring": -100},
        {"episode": 2, "airingAt": 1700604800, "timeUntilAiring": 604700}
      ]}}}
    }))
    .unwrap();
    let nodes = env.data.unwrap().media.unwrap().airing_schedule.unwrap().nodes;
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].episode, 2);
  }
}
