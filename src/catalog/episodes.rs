//! Episode counts derived from airing data.

use super::types::{AiringSlot, Anime, MediaStatus};

/// Grid length used when the total episode count is unknown.
pub const FALLBACK_EPISODE_COUNT: u32 = 100;

/// Episodes shown per page of the tracker grid.
pub const EPISODE_PAGE_SIZE: u32 = 50;

/// Number of episodes that have already aired.
///
/// For a releasing show the episode about to air has not been released yet,
/// so the count is one less than `next_airing_episode.episode`.
pub fn released_episode_count(anime: &Anime) -> u32 {
  match (&anime.status, &anime.next_airing_episode) {
    (Some(MediaStatus::Releasing), Some(next)) => next.episode.saturating_sub(1),
    _ => anime.episodes.unwrap_or(0),
  }
}

/// Highest episode whose airing time is at or before `now` (unix seconds).
pub fn released_from_schedule(slots: &[AiringSlot], now: i64) -> u32 {
  slots
    .iter()
    .filter(|slot| slot.airing_at <= now)
    .map(|slot| slot.episode)
    .max()
    .unwrap_or(0)
}

/// Length of the episode tracker grid for a show with `total` episodes.
pub fn trackable_episodes(total: Option<u32>) -> u32 {
  match total {
    Some(n) if n > 0 => n,
    _ => FALLBACK_EPISODE_COUNT,
  }
}

/// Number of grid pages needed for `total` episodes.
pub fn episode_pages(total: Option<u32>) -> u32 {
  trackable_episodes(total).div_ceil(EPISODE_PAGE_SIZE)
}

/// Episodes shown on the zero-based grid `page`, clamped to the grid length.
pub fn episode_page(total: Option<u32>, page: u32) -> std::ops::RangeInclusive<u32> {
  let len = trackable_episodes(total);
  let start = page.saturating_mul(EPISODE_PAGE_SIZE).saturating_add(1);
  let end = start.saturating_add(EPISODE_PAGE_SIZE - 1).min(len);
  start..=end
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::types::{CoverImage, NextAiring, Title};

  fn anime(status: Option<MediaStatus>, episodes: Option<u32>, next: Option<u32>) -> Anime {
    Anime {
      id: 1,
      id_mal: None,
      title: Title::default(),
      cover_image: CoverImage::default(),
      banner_image: None,
      description: None,
      average_score: None,
      episodes,
      format: None,
      status,
      season: None,
      season_year: None,
      genres: Vec::new(),
      studios: Vec::new(),
      source: None,
      is_adult: None,
      next_airing_episode: next.map(|episode| NextAiring {
        episode,
        airing_at: 0,
        time_until_airing: 0,
      }),
    }
  }

  #[test]
  fn test_released_count_for_releasing_show() {
    let a = anime(Some(MediaStatus::Releasing), Some(24), Some(8));
    assert_eq!(released_episode_count(&a), 7);
  }

  #[test]
  fn test_released_count_first_episode_pending() {
    let a = anime(Some(MediaStatus::Releasing), None, Some(1));
    assert_eq!(released_episode_count(&a), 0);
  }

  #[test]
  fn test_released_count_for_finished_show() {
    let a = anime(Some(MediaStatus::Finished), Some(12), None);
    assert_eq!(released_episode_count(&a), 12);

    let unknown = anime(Some(MediaStatus::Releasing), None, None);
    assert_eq!(released_episode_count(&unknown), 0);
  }

  #[test]
  fn test_released_from_schedule() {
    let slot = |episode, airing_at| AiringSlot {
      episode,
      airing_at,
      time_until_airing: 0,
    };
    let slots = [slot(1, 100), slot(2, 200), slot(3, 300)];
    assert_eq!(released_from_schedule(&slots, 250), 2);
    assert_eq!(released_from_schedule(&slots, 300), 3);
    assert_eq!(released_from_schedule(&slots, 50), 0);
    assert_eq!(released_from_schedule(&[], 1_000), 0);
  }

  #[test]
  fn test_trackable_episodes_and_pages() {
    assert_eq!(trackable_episodes(Some(12)), 12);
    assert_eq!(trackable_episodes(Some(0)), FALLBACK_EPISODE_COUNT);
    assert_eq!(trackable_episodes(None), FALLBACK_EPISODE_COUNT);

    assert_eq!(episode_pages(Some(12)), 1);
    assert_eq!(episode_pages(Some(51)), 2);
    assert_eq!(episode_pages(None), 2);

    assert_eq!(episode_page(Some(64), 0), 1..=50);
    assert_eq!(episode_page(Some(64), 1), 51..=64);
  }
}
