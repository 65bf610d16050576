//! Plain-text formatting for command output.

use chrono::DateTime;

use crate::catalog::episodes::{episode_page, episode_pages, trackable_episodes};
use crate::catalog::{AiringSlot, Anime, Genre, JikanAnime};
use crate::text::format_synopsis;
use crate::watchlist::{EpisodeSet, WatchlistRecord};

const GRID_COLUMNS: usize = 10;

/// Truncate a string to max length, adding "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else if max_len <= 3 {
    s.chars().take(max_len).collect()
  } else {
    let truncated: String = s.chars().take(max_len - 3).collect();
    format!("{}...", truncated)
  }
}

/// "2d 3h", "4h 10m", "12m". Negative durations render as "aired".
pub fn countdown(seconds: i64) -> String {
  if seconds <= 0 {
    return "aired".to_string();
  }
  let days = seconds / 86_400;
  let hours = (seconds % 86_400) / 3_600;
  let minutes = (seconds % 3_600) / 60;
  match (days, hours) {
    (0, 0) => format!("{}m", minutes.max(1)),
    (0, h) => format!("{}h {}m", h, minutes),
    (d, h) => format!("{}d {}h", d, h),
  }
}

fn timestamp(unix: i64) -> String {
  DateTime::from_timestamp(unix, 0)
    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
    .unwrap_or_else(|| unix.to_string())
}

// ============================================================================
// Catalog
// ============================================================================

pub fn anime_line(anime: &Anime) -> String {
  let mut facts = Vec::new();
  if let Some(format) = &anime.format {
    facts.push(format.clone());
  }
  if let Some(episodes) = anime.episodes {
    facts.push(format!("{} eps", episodes));
  }
  if let Some(score) = anime.average_score {
    facts.push(format!("{}%", score));
  }

  let mut line = format!("{:>7}  {}", anime.id, truncate(anime.display_title(), 60));
  if !facts.is_empty() {
    line.push_str(&format!("  [{}]", facts.join(", ")));
  }
  line
}

/// Multi-line detail view. `released` is the number of aired episodes.
pub fn anime_details(anime: &Anime, released: u32) -> String {
  let mut lines = vec![anime.display_title().to_string()];

  if let Some(native) = &anime.title.native {
    lines.push(native.clone());
  }
  lines.push(String::new());
  lines.push(format!("AniList id: {}", anime.id));
  if let Some(mal) = anime.id_mal {
    lines.push(format!("MAL id:     {}", mal));
  }
  if let Some(status) = &anime.status {
    lines.push(format!("Status:     {}", status));
  }
  match (&anime.season, anime.season_year) {
    (Some(season), Some(year)) => lines.push(format!("Season:     {} {}", season, year)),
    (None, Some(year)) => lines.push(format!("Year:       {}", year)),
    _ => {}
  }
  let total = anime
    .episodes
    .map(|n| n.to_string())
    .unwrap_or_else(|| "?".to_string());
  lines.push(format!("Episodes:   {} released / {}", released, total));
  if let Some(next) = &anime.next_airing_episode {
    lines.push(format!(
      "Next:       episode {} in {} ({})",
      next.episode,
      countdown(next.time_until_airing),
      timestamp(next.airing_at)
    ));
  }
  if let Some(score) = anime.average_score {
    lines.push(format!("Score:      {}%", score));
  }
  if !anime.genres.is_empty() {
    lines.push(format!("Genres:     {}", anime.genres.join(", ")));
  }
  if !anime.studios.is_empty() {
    let studios: Vec<&str> = anime.studios.iter().map(|s| s.name.as_str()).collect();
    lines.push(format!("Studios:    {}", studios.join(", ")));
  }
  if let Some(description) = &anime.description {
    lines.push(String::new());
    lines.push(format_synopsis(description));
  }

  lines.join("\n")
}

pub fn jikan_line(anime: &JikanAnime) -> String {
  let mut facts = Vec::new();
  if let Some(kind) = &anime.kind {
    facts.push(kind.clone());
  }
  if let Some(episodes) = anime.episodes {
    facts.push(format!("{} eps", episodes));
  }
  if let Some(score) = anime.score {
    facts.push(format!("{:.2}", score));
  }

  let mut line = format!("{:>7}  {}", anime.mal_id, truncate(anime.display_title(), 60));
  if !facts.is_empty() {
    line.push_str(&format!("  [{}]", facts.join(", ")));
  }
  line
}

pub fn jikan_details(anime: &JikanAnime) -> String {
  let mut lines = vec![anime.display_title().to_string()];
  if let Some(japanese) = &anime.title_japanese {
    lines.push(japanese.clone());
  }
  lines.push(String::new());
  lines.push(format!("MAL id:     {}", anime.mal_id));
  if let Some(status) = &anime.status {
    lines.push(format!("Status:     {}", status));
  }
  if let Some(aired) = anime.aired.as_ref().and_then(|a| a.string.as_ref()) {
    lines.push(format!("Aired:      {}", aired));
  }
  if let Some(episodes) = anime.episodes {
    lines.push(format!("Episodes:   {}", episodes));
  }
  if let Some(rating) = &anime.rating {
    lines.push(format!("Rating:     {}", rating));
  }
  if let Some(score) = anime.score {
    lines.push(format!("Score:      {:.2}", score));
  }
  if !anime.genres.is_empty() {
    let genres: Vec<&str> = anime.genres.iter().map(|g| g.name.as_str()).collect();
    lines.push(format!("Genres:     {}", genres.join(", ")));
  }
  if let Some(synopsis) = &anime.synopsis {
    lines.push(String::new());
    lines.push(format_synopsis(synopsis));
  }
  lines.join("\n")
}

pub fn genre_line(genre: &Genre) -> String {
  format!("{:>4}  {}", genre.id, genre.name)
}

pub fn schedule_line(slot: &AiringSlot, now: i64) -> String {
  let marker = if slot.airing_at <= now { "aired" } else { "upcoming" };
  format!(
    "  ep {:>4}  {}  {}",
    slot.episode,
    timestamp(slot.airing_at),
    marker
  )
}

// ============================================================================
// Watchlist
// ============================================================================

pub fn record_line(record: &WatchlistRecord) -> String {
  let total = record
    .total_episodes
    .map(|n| n.to_string())
    .unwrap_or_else(|| "?".to_string());
  format!(
    "{:>7}  {}  {}/{} ({:.0}%)",
    record.key().to_string(),
    truncate(&record.title, 50),
    record.episodes_watched.len(),
    total,
    record.progress_percent()
  )
}

/// One page of the episode tracker, `GRID_COLUMNS` episodes per row.
/// Watched episodes are bracketed.
pub fn episode_grid(total: Option<u32>, watched: &EpisodeSet, page: u32) -> String {
  let pages = episode_pages(total);
  let range = episode_page(total, page);

  let cells: Vec<String> = range
    .clone()
    .map(|ep| {
      if watched.contains(ep) {
        format!("[{:>3}]", ep)
      } else {
        format!(" {:>3} ", ep)
      }
    })
    .collect();

  let mut lines = vec![format!(
    "Episodes {}-{} of {} (page {}/{})",
    range.start(),
    range.end(),
    trackable_episodes(total),
    page.saturating_add(1),
    pages
  )];
  lines.extend(cells.chunks(GRID_COLUMNS).map(|row| row.join("")));
  lines.join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::types::{CoverImage, NextAiring, Title};
  use crate::watchlist::Source;
  use chrono::Utc;

  #[test]
  fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a longer title", 8), "a lon...");
    assert_eq!(truncate("abcdef", 3), "abc");
  }

  #[test]
  fn test_countdown() {
    assert_eq!(countdown(-5), "aired");
    assert_eq!(countdown(30), "1m");
    assert_eq!(countdown(3 * 3600 + 120), "3h 2m");
    assert_eq!(countdown(2 * 86_400 + 5 * 3600), "2d 5h");
  }

  #[test]
  fn test_anime_line_and_details() {
    let anime = Anime {
      id: 154587,
      id_mal: Some(52991),
      title: Title {
        romaji: Some("Sousou no Frieren".into()),
        english: Some("Frieren: Beyond Journey's End".into()),
        native: None,
      },
      cover_image: CoverImage::default(),
      banner_image: None,
      description: Some("An elf<br>mage.".into()),
      average_score: Some(91),
      episodes: Some(28),
      format: Some("TV".into()),
      status: None,
      season: Some("FALL".into()),
      season_year: Some(2023),
      genres: vec!["Adventure".into()],
      studios: Vec::new(),
      source: None,
      is_adult: Some(false),
      next_airing_episode: Some(NextAiring {
        episode: 10,
        airing_at: 0,
        time_until_airing: 7200,
      }),
    };

    assert_eq!(
      anime_line(&anime),
      " 154587  Frieren: Beyond Journey's End  [TV, 28 eps, 91%]"
    );

    let details = anime_details(&anime, 9);
    assert!(details.contains("Episodes:   9 released / 28"));
    assert!(details.contains("Next:       episode 10 in 2h 0m"));
    assert!(details.ends_with("An elf\nmage."));
  }

  #[test]
  fn test_record_line_and_grid() {
    let mut watched = EpisodeSet::new();
    watched.mark_through(3);
    let mut record = WatchlistRecord {
      source: Source::AniList,
      id: 1,
      mal_id: None,
      title: "Mushishi".into(),
      image_url: None,
      total_episodes: Some(12),
      episodes_watched: watched.clone(),
      added_at: Utc::now(),
    };
    assert_eq!(record_line(&record), "      1  Mushishi  3/12 (25%)");
    record.source = Source::Mal;
    assert_eq!(record_line(&record), "  mal:1  Mushishi  3/12 (25%)");

    let grid = episode_grid(Some(12), &watched, 0);
    let lines: Vec<&str> = grid.lines().collect();
    assert_eq!(lines[0], "Episodes 1-12 of 12 (page 1/1)");
    assert!(lines[1].starts_with("[  1][  2][  3]   4 "));
    assert_eq!(lines.len(), 3);
  }
}
