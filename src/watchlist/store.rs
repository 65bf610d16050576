//! SQLite-backed watchlist store.

use chrono::{DateTime, SecondsFormat, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;
use tracing::debug;

use crate::db::Database;

use super::{EpisodeSet, RecordKey, Source, WatchlistRecord};

const SELECT_COLUMNS: &str = "SELECT source, anime_id, mal_id, title, image_url, total_episodes, \
   episodes_watched, added_at FROM watchlist";

/// Raw row before the source, JSON and timestamp columns are decoded.
type RecordRow = (
  String,
  u64,
  Option<u64>,
  String,
  Option<String>,
  Option<u32>,
  String,
  String,
);

/// Per-user watchlists stored in one SQLite table.
pub struct WatchlistStore {
  db: Mutex<Database>,
}

impl WatchlistStore {
  pub fn new(db: Database) -> Self {
    Self { db: Mutex::new(db) }
  }

  /// Insert or replace the whole record.
  pub fn add(&self, user: &str, record: &WatchlistRecord) -> Result<()> {
    let db = self.db.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    write_record(db.conn(), user, record)?;
    debug!(user, anime = %record.key(), "watchlist record saved");
    Ok(())
  }

  /// Delete a record. Removing a missing record is not an error.
  pub fn remove(&self, user: &str, key: RecordKey) -> Result<bool> {
    let db = self.db.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let removed = db
      .conn()
      .execute(
        "DELETE FROM watchlist WHERE user_id = ? AND source = ? AND anime_id = ?",
        params![user, key.source.as_str(), key.id],
      )
      .map_err(|e| eyre!("Failed to remove watchlist record: {}", e))?;
    Ok(removed > 0)
  }

  pub fn get(&self, user: &str, key: RecordKey) -> Result<Option<WatchlistRecord>> {
    let db = self.db.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    read_record(db.conn(), user, key)
  }

  pub fn contains(&self, user: &str, key: RecordKey) -> Result<bool> {
    Ok(self.get(user, key)?.is_some())
  }

  /// All records for `user`, most recently added first.
  pub fn list(&self, user: &str) -> Result<Vec<WatchlistRecord>> {
    let db = self.db.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let mut stmt = db
      .conn()
      .prepare(&format!(
        "{} WHERE user_id = ? ORDER BY added_at DESC, rowid DESC",
        SELECT_COLUMNS
      ))
      .map_err(|e| eyre!("Failed to prepare watchlist query: {}", e))?;

    let rows = stmt
      .query_map(params![user], map_row)
      .map_err(|e| eyre!("Failed to query watchlist: {}", e))?;

    let records = rows
      .map(|row| {
        row
          .map_err(|e| eyre!("Failed to read watchlist row: {}", e))
          .and_then(decode_row)
      })
      .collect::<Result<Vec<_>>>();
    records
  }

  /// Replace the watched episodes of an existing record.
  pub fn update_episodes(&self, user: &str, key: RecordKey, episodes: &EpisodeSet) -> Result<()> {
    let db = self.db.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    write_episodes(db.conn(), user, key, episodes)
  }

  /// Flip one episode's watched state. Returns the new state.
  pub fn toggle_episode(&self, user: &str, key: RecordKey, episode: u32) -> Result<bool> {
    let db = self.db.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let mut record = read_record(db.conn(), user, key)?
      .ok_or_else(|| eyre!("Anime {} is not on the watchlist", key))?;

    let watched = record.toggle_episode(episode)?;
    write_episodes(db.conn(), user, key, &record.episodes_watched)?;
    debug!(user, anime = %key, episode, watched, "episode toggled");
    Ok(watched)
  }

  /// Mark episodes `1..=through` watched, clamped to the record's episode
  /// count. Returns the updated record.
  pub fn mark_through(&self, user: &str, key: RecordKey, through: u32) -> Result<WatchlistRecord> {
    let db = self.db.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let mut record = read_record(db.conn(), user, key)?
      .ok_or_else(|| eyre!("Anime {} is not on the watchlist", key))?;

    let before = record.episodes_watched.len();
    let marked = record.mark_through(through);
    if record.episodes_watched.len() > before {
      write_episodes(db.conn(), user, key, &record.episodes_watched)?;
    }
    debug!(user, anime = %key, through, marked, "episodes marked");
    Ok(record)
  }

  /// Release the underlying database.
  pub fn close(self) -> Result<()> {
    self
      .db
      .into_inner()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?
      .close()
  }
}

// ============================================================================
// Row helpers
// ============================================================================

fn write_record(conn: &Connection, user: &str, record: &WatchlistRecord) -> Result<()> {
  let episodes = serde_json::to_string(&record.episodes_watched)
    .map_err(|e| eyre!("Failed to serialize episodes: {}", e))?;
  let added_at = record.added_at.to_rfc3339_opts(SecondsFormat::Micros, true);

  conn
    .execute(
      "INSERT INTO watchlist
         (user_id, source, anime_id, mal_id, title, image_url, total_episodes, episodes_watched, added_at)
       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
       ON CONFLICT (user_id, source, anime_id) DO UPDATE SET
         mal_id = excluded.mal_id,
         title = excluded.title,
         image_url = excluded.image_url,
         total_episodes = excluded.total_episodes,
         episodes_watched = excluded.episodes_watched,
         added_at = excluded.added_at",
      params![
        user,
        record.source.as_str(),
        record.id,
        record.mal_id,
        record.title,
        record.image_url,
        record.total_episodes,
        episodes,
        added_at
      ],
    )
    .map_err(|e| eyre!("Failed to save watchlist record: {}", e))?;

  Ok(())
}

fn write_episodes(
  conn: &Connection,
  user: &str,
  key: RecordKey,
  episodes: &EpisodeSet,
) -> Result<()> {
  let json =
    serde_json::to_string(episodes).map_err(|e| eyre!("Failed to serialize episodes: {}", e))?;

  let updated = conn
    .execute(
      "UPDATE watchlist SET episodes_watched = ?
       WHERE user_id = ? AND source = ? AND anime_id = ?",
      params![json, user, key.source.as_str(), key.id],
    )
    .map_err(|e| eyre!("Failed to update episodes: {}", e))?;

  if updated == 0 {
    return Err(eyre!("Anime {} is not on the watchlist", key));
  }
  Ok(())
}

fn read_record(conn: &Connection, user: &str, key: RecordKey) -> Result<Option<WatchlistRecord>> {
  let row = conn
    .query_row(
      &format!(
        "{} WHERE user_id = ? AND source = ? AND anime_id = ?",
        SELECT_COLUMNS
      ),
      params![user, key.source.as_str(), key.id],
      map_row,
    )
    .optional()
    .map_err(|e| eyre!("Failed to read watchlist record: {}", e))?;

  row.map(decode_row).transpose()
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
  Ok((
    row.get(0)?,
    row.get(1)?,
    row.get(2)?,
    row.get(3)?,
    row.get(4)?,
    row.get(5)?,
    row.get(6)?,
    row.get(7)?,
  ))
}

fn decode_row(row: RecordRow) -> Result<WatchlistRecord> {
  let (source, id, mal_id, title, image_url, total_episodes, episodes_json, added_at) = row;

  let source = Source::parse(&source)?;
  let episodes_watched: EpisodeSet = serde_json::from_str(&episodes_json)
    .map_err(|e| eyre!("Corrupt episode list for anime {}: {}", id, e))?;
  let added_at = DateTime::parse_from_rfc3339(&added_at)
    .map_err(|e| eyre!("Invalid added_at for anime {}: {}", id, e))?
    .with_timezone(&Utc);

  Ok(WatchlistRecord {
    source,
    id,
    mal_id,
    title,
    image_url,
    total_episodes,
    episodes_watched,
    added_at,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn store() -> WatchlistStore {
    WatchlistStore::new(Database::open_in_memory().unwrap())
  }

  fn record(id: u64, title: &str) -> WatchlistRecord {
    WatchlistRecord {
      source: Source::AniList,
      id,
      mal_id: Some(id + 1000),
      title: title.to_string(),
      image_url: Some(format!("https://img/{}.jpg", id)),
      total_episodes: Some(12),
      episodes_watched: EpisodeSet::new(),
      added_at: Utc::now(),
    }
  }

  fn key(id: u64) -> RecordKey {
    RecordKey::anilist(id)
  }

  #[test]
  fn test_add_get_remove() {
    let store = store();
    let r = record(1, "Frieren");
    store.add("alice", &r).unwrap();

    let loaded = store.get("alice", key(1)).unwrap().unwrap();
    assert_eq!(loaded.title, "Frieren");
    assert_eq!(loaded.mal_id, Some(1001));
    assert_eq!(loaded.source, Source::AniList);
    assert!(store.contains("alice", key(1)).unwrap());
    assert!(!store.contains("bob", key(1)).unwrap());
    assert!(!store.contains("alice", RecordKey::mal(1)).unwrap());

    assert!(store.remove("alice", key(1)).unwrap());
    assert!(!store.remove("alice", key(1)).unwrap());
    assert!(store.get("alice", key(1)).unwrap().is_none());
  }

  #[test]
  fn test_add_replaces_whole_record() {
    let store = store();
    store.add("alice", &record(1, "Old")).unwrap();
    store.toggle_episode("alice", key(1), 3).unwrap();

    store.add("alice", &record(1, "New")).unwrap();
    let loaded = store.get("alice", key(1)).unwrap().unwrap();
    assert_eq!(loaded.title, "New");
    assert!(loaded.episodes_watched.is_empty());
  }

  #[test]
  fn test_mal_record_does_not_collide_with_anilist_id() {
    let store = store();
    store.add("alice", &record(457, "Bocchi the Rock!")).unwrap();
    store.toggle_episode("alice", key(457), 5).unwrap();

    let mut mushishi = record(457, "Mushishi");
    mushishi.source = Source::Mal;
    mushishi.mal_id = Some(457);
    store.add("alice", &mushishi).unwrap();

    let anilist = store.get("alice", key(457)).unwrap().unwrap();
    assert_eq!(anilist.title, "Bocchi the Rock!");
    assert_eq!(anilist.episodes_watched.iter().collect::<Vec<_>>(), vec![5]);

    let mal = store.get("alice", RecordKey::mal(457)).unwrap().unwrap();
    assert_eq!(mal.title, "Mushishi");
    assert!(mal.episodes_watched.is_empty());
    assert_eq!(store.list("alice").unwrap().len(), 2);

    assert!(store.remove("alice", RecordKey::mal(457)).unwrap());
    assert!(store.contains("alice", key(457)).unwrap());
  }

  #[test]
  fn test_list_newest_first() {
    let store = store();
    let mut older = record(1, "Older");
    older.added_at = Utc::now() - Duration::days(1);
    store.add("alice", &older).unwrap();
    store.add("alice", &record(2, "Newer")).unwrap();
    store.add("bob", &record(3, "Other user")).unwrap();

    let titles: Vec<String> = store
      .list("alice")
      .unwrap()
      .into_iter()
      .map(|r| r.title)
      .collect();
    assert_eq!(titles, vec!["Newer", "Older"]);
  }

  #[test]
  fn test_toggle_persists_and_restores() {
    let store = store();
    store.add("alice", &record(1, "Frieren")).unwrap();

    assert!(store.toggle_episode("alice", key(1), 4).unwrap());
    assert!(store.toggle_episode("alice", key(1), 2).unwrap());
    let loaded = store.get("alice", key(1)).unwrap().unwrap();
    assert_eq!(loaded.episodes_watched.iter().collect::<Vec<_>>(), vec![2, 4]);

    assert!(!store.toggle_episode("alice", key(1), 4).unwrap());
    let loaded = store.get("alice", key(1)).unwrap().unwrap();
    assert_eq!(loaded.episodes_watched.iter().collect::<Vec<_>>(), vec![2]);
  }

  #[test]
  fn test_toggle_missing_record_fails() {
    let store = store();
    assert!(store.toggle_episode("alice", key(99), 1).is_err());
  }

  #[test]
  fn test_toggle_past_total_fails() {
    let store = store();
    store.add("alice", &record(1, "Frieren")).unwrap();
    assert!(store.toggle_episode("alice", key(1), 13).is_err());
    assert!(store
      .get("alice", key(1))
      .unwrap()
      .unwrap()
      .episodes_watched
      .is_empty());
  }

  #[test]
  fn test_mark_through() {
    let store = store();
    store.add("alice", &record(1, "Frieren")).unwrap();
    store.toggle_episode("alice", key(1), 2).unwrap();

    let updated = store.mark_through("alice", key(1), 5).unwrap();
    assert_eq!(
      updated.episodes_watched.iter().collect::<Vec<_>>(),
      vec![1, 2, 3, 4, 5]
    );

    let loaded = store.get("alice", key(1)).unwrap().unwrap();
    assert_eq!(loaded.episodes_watched, updated.episodes_watched);
  }

  #[test]
  fn test_mark_through_clamps_to_total() {
    let store = store();
    store.add("alice", &record(1, "Frieren")).unwrap();

    let updated = store.mark_through("alice", key(1), 1000).unwrap();
    assert_eq!(updated.episodes_watched.len(), 12);
    assert_eq!(updated.progress_percent(), 100.0);

    let loaded = store.get("alice", key(1)).unwrap().unwrap();
    assert_eq!(loaded.episodes_watched.last(), Some(12));
  }

  #[test]
  fn test_update_episodes_requires_existing_record() {
    let store = store();
    let mut set = EpisodeSet::new();
    set.mark_through(2);
    assert!(store.update_episodes("alice", key(1), &set).is_err());

    store.add("alice", &record(1, "Frieren")).unwrap();
    store.update_episodes("alice", key(1), &set).unwrap();
    assert_eq!(
      store.get("alice", key(1)).unwrap().unwrap().episodes_watched,
      set
    );
  }

  #[test]
  fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watchlist.db");

    let store = WatchlistStore::new(Database::open(&path).unwrap());
    store.add("alice", &record(7, "Mushishi")).unwrap();
    store.mark_through("alice", key(7), 3).unwrap();
    store.close().unwrap();

    let store = WatchlistStore::new(Database::open(&path).unwrap());
    let loaded = store.get("alice", key(7)).unwrap().unwrap();
    assert_eq!(loaded.episodes_watched.len(), 3);
  }
}
