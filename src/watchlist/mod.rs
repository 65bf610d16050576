//! Watchlist records and watched-episode tracking.

pub mod store;

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::{Anime, JikanAnime};

pub use store::WatchlistStore;

/// Highest episode number the tracker accepts.
pub const MAX_EPISODE: u32 = 5000;

// ============================================================================
// Keys
// ============================================================================

/// Catalog a watchlist id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  AniList,
  Mal,
}

impl Source {
  pub fn as_str(self) -> &'static str {
    match self {
      Source::AniList => "anilist",
      Source::Mal => "mal",
    }
  }

  pub fn parse(raw: &str) -> Result<Self> {
    match raw {
      "anilist" => Ok(Source::AniList),
      "mal" => Ok(Source::Mal),
      other => Err(eyre!("Unknown watchlist source: {}", other)),
    }
  }
}

/// Identifies one record within a user's watchlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey {
  pub source: Source,
  pub id: u64,
}

impl RecordKey {
  pub fn anilist(id: u64) -> Self {
    Self {
      source: Source::AniList,
      id,
    }
  }

  pub fn mal(id: u64) -> Self {
    Self {
      source: Source::Mal,
      id,
    }
  }
}

impl fmt::Display for RecordKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.source {
      Source::AniList => write!(f, "{}", self.id),
      Source::Mal => write!(f, "mal:{}", self.id),
    }
  }
}

// ============================================================================
// EpisodeSet
// ============================================================================

/// Watched episode numbers, unique and ascending. Serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct EpisodeSet(BTreeSet<u32>);

impl EpisodeSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Flip `episode` between watched and unwatched. Returns the new state.
  pub fn toggle(&mut self, episode: u32) -> Result<bool> {
    if episode == 0 {
      return Err(eyre!("Episode numbers start at 1"));
    }
    if episode > MAX_EPISODE {
      return Err(eyre!("Episode {} is past the last trackable episode", episode));
    }
    if self.0.remove(&episode) {
      Ok(false)
    } else {
      self.0.insert(episode);
      Ok(true)
    }
  }

  /// Mark every episode in `1..=through` as watched, stopping at
  /// `MAX_EPISODE`. Returns how many were added.
  pub fn mark_through(&mut self, through: u32) -> usize {
    let before = self.0.len();
    self.0.extend(1..=through.min(MAX_EPISODE));
    self.0.len() - before
  }

  pub fn contains(&self, episode: u32) -> bool {
    self.0.contains(&episode)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Highest watched episode.
  pub fn last(&self) -> Option<u32> {
    self.0.last().copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
    self.0.iter().copied()
  }
}

impl TryFrom<Vec<u32>> for EpisodeSet {
  type Error = String;

  fn try_from(episodes: Vec<u32>) -> std::result::Result<Self, Self::Error> {
    if episodes.contains(&0) {
      return Err("episode numbers start at 1".to_string());
    }
    if episodes.iter().any(|&ep| ep > MAX_EPISODE) {
      return Err(format!("episode numbers stop at {}", MAX_EPISODE));
    }
    Ok(Self(episodes.into_iter().collect()))
  }
}

impl From<EpisodeSet> for Vec<u32> {
  fn from(set: EpisodeSet) -> Self {
    set.0.into_iter().collect()
  }
}

// ============================================================================
// WatchlistRecord
// ============================================================================

/// One anime on a user's watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistRecord {
  /// Catalog `id` comes from
  pub source: Source,
  pub id: u64,
  pub mal_id: Option<u64>,
  pub title: String,
  pub image_url: Option<String>,
  pub total_episodes: Option<u32>,
  pub episodes_watched: EpisodeSet,
  pub added_at: DateTime<Utc>,
}

impl WatchlistRecord {
  pub fn from_anime(anime: &Anime) -> Self {
    Self {
      source: Source::AniList,
      id: anime.id,
      mal_id: anime.id_mal,
      title: anime.display_title().to_string(),
      image_url: anime.image_url().map(String::from),
      total_episodes: anime.episodes,
      episodes_watched: EpisodeSet::new(),
      added_at: Utc::now(),
    }
  }

  /// Record for an anime known only from MyAnimeList, keyed by its MAL id.
  pub fn from_jikan(anime: &JikanAnime) -> Self {
    Self {
      source: Source::Mal,
      id: anime.mal_id,
      mal_id: Some(anime.mal_id),
      title: anime.display_title().to_string(),
      image_url: anime.image_url().map(String::from),
      total_episodes: anime.episodes,
      episodes_watched: EpisodeSet::new(),
      added_at: Utc::now(),
    }
  }

  pub fn key(&self) -> RecordKey {
    RecordKey {
      source: self.source,
      id: self.id,
    }
  }

  /// Last episode that can be marked: the known total, else `MAX_EPISODE`.
  pub fn last_episode(&self) -> u32 {
    match self.total_episodes {
      Some(total) if total > 0 => total.min(MAX_EPISODE),
      _ => MAX_EPISODE,
    }
  }

  /// Flip one episode, rejecting numbers past the known total.
  pub fn toggle_episode(&mut self, episode: u32) -> Result<bool> {
    if episode > self.last_episode() {
      return Err(eyre!(
        "{} has only {} episodes",
        self.title,
        self.last_episode()
      ));
    }
    self.episodes_watched.toggle(episode)
  }

  /// Mark `1..=through` watched, clamped to `last_episode`. Returns the
  /// episode marking actually stopped at.
  pub fn mark_through(&mut self, through: u32) -> u32 {
    let through = through.min(self.last_episode());
    self.episodes_watched.mark_through(through);
    through
  }

  /// Watched share of the total, 0 when the total is unknown.
  pub fn progress_percent(&self) -> f64 {
    match self.total_episodes {
      Some(total) if total > 0 => self.episodes_watched.len() as f64 / total as f64 * 100.0,
      _ => 0.0,
    }
  }
}
