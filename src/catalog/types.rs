//! Domain types shared by the catalog clients.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Anime titles in the languages AniList provides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Title {
  pub romaji: Option<String>,
  pub english: Option<String>,
  pub native: Option<String>,
}

impl Title {
  /// English title, falling back to romaji, then native.
  pub fn preferred(&self) -> &str {
    [&self.english, &self.romaji, &self.native]
      .into_iter()
      .flatten()
      .map(String::as_str)
      .find(|t| !t.trim().is_empty())
      .unwrap_or("Untitled")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverImage {
  pub large: Option<String>,
  pub extra_large: Option<String>,
  pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Studio {
  pub id: u64,
  pub name: String,
}

/// The next episode scheduled to air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextAiring {
  pub episode: u32,
  /// Unix timestamp (seconds)
  pub airing_at: i64,
  /// Seconds from the time of the response
  pub time_until_airing: i64,
}

/// One entry of an airing schedule.
pub type AiringSlot = NextAiring;

/// AniList media status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaStatus {
  Finished,
  Releasing,
  NotYetReleased,
  Cancelled,
  Hiatus,
  Other(String),
}

impl From<String> for MediaStatus {
  fn from(value: String) -> Self {
    match value.as_str() {
      "FINISHED" => MediaStatus::Finished,
      "RELEASING" => MediaStatus::Releasing,
      "NOT_YET_RELEASED" => MediaStatus::NotYetReleased,
      "CANCELLED" => MediaStatus::Cancelled,
      "HIATUS" => MediaStatus::Hiatus,
      _ => MediaStatus::Other(value),
    }
  }
}

impl From<MediaStatus> for String {
  fn from(value: MediaStatus) -> Self {
    match value {
      MediaStatus::Finished => "FINISHED".to_string(),
      MediaStatus::Releasing => "RELEASING".to_string(),
      MediaStatus::NotYetReleased => "NOT_YET_RELEASED".to_string(),
      MediaStatus::Cancelled => "CANCELLED".to_string(),
      MediaStatus::Hiatus => "HIATUS".to_string(),
      MediaStatus::Other(other) => other,
    }
  }
}

impl fmt::Display for MediaStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      MediaStatus::Finished => "Finished",
      MediaStatus::Releasing => "Releasing",
      MediaStatus::NotYetReleased => "Not yet released",
      MediaStatus::Cancelled => "Cancelled",
      MediaStatus::Hiatus => "Hiatus",
      MediaStatus::Other(other) => other.as_str(),
    };
    f.write_str(label)
  }
}

/// Anime as returned by AniList, flattened for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
  pub id: u64,
  pub id_mal: Option<u64>,
  pub title: Title,
  pub cover_image: CoverImage,
  pub banner_image: Option<String>,
  pub description: Option<String>,
  pub average_score: Option<u32>,
  pub episodes: Option<u32>,
  pub format: Option<String>,
  pub status: Option<MediaStatus>,
  pub season: Option<String>,
  pub season_year: Option<i32>,
  pub genres: Vec<String>,
  pub studios: Vec<Studio>,
  pub source: Option<String>,
  pub is_adult: Option<bool>,
  pub next_airing_episode: Option<NextAiring>,
}

impl Anime {
  pub fn display_title(&self) -> &str {
    self.title.preferred()
  }

  pub fn image_url(&self) -> Option<&str> {
    self
      .cover_image
      .large
      .as_deref()
      .or(self.cover_image.extra_large.as_deref())
  }
}

/// A genre. AniList genres are numbered by position in the genre collection,
/// Jikan genres carry their MyAnimeList id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
  pub id: u32,
  pub name: String,
}

impl Genre {
  pub fn new(id: u32, name: impl Into<String>) -> Self {
    Self {
      id,
      name: name.into(),
    }
  }
}
