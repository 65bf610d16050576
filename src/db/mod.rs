pub mod schema;

use color_eyre::{eyre::eyre, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// SQLite connection holding the watchlist.
pub struct Database {
  conn: Connection,
}

impl Database {
  /// Open or create the database at `path`, creating parent directories.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)
          .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
      }
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open database at {}: {}", path.display(), e))?;

    let db = Self { conn };
    db.run_migrations()?;

    Ok(db)
  }

  /// Open a private in-memory database.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory database: {}", e))?;

    let db = Self { conn };
    db.run_migrations()?;

    Ok(db)
  }

  fn run_migrations(&self) -> Result<()> {
    self
      .conn
      .execute_batch(schema::SCHEMA)
      .map_err(|e| eyre!("Failed to run migrations: {}", e))?;

    if !self.has_column("watchlist", "source")? {
      info!("adding source column to watchlist");
      self
        .conn
        .execute_batch(schema::ADD_SOURCE)
        .map_err(|e| eyre!("Failed to migrate watchlist: {}", e))?;
    }
    Ok(())
  }

  fn has_column(&self, table: &str, column: &str) -> Result<bool> {
    let mut stmt = self
      .conn
      .prepare(&format!("PRAGMA table_info({})", table))
      .map_err(|e| eyre!("Failed to inspect {}: {}", table, e))?;
    let names = stmt
      .query_map([], |row| row.get::<_, String>(1))
      .map_err(|e| eyre!("Failed to inspect {}: {}", table, e))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| eyre!("Failed to inspect {}: {}", table, e))?;
    Ok(names.iter().any(|name| name == column))
  }

  pub fn conn(&self) -> &Connection {
    &self.conn
  }

  /// Close the connection, reporting any error SQLite raises on close.
  pub fn close(self) -> Result<()> {
    self
      .conn
      .close()
      .map_err(|(_, e)| eyre!("Failed to close database: {}", e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_open_creates_parent_dirs_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("watchlist.db");

    let db = Database::open(&path).unwrap();
    assert!(path.exists());

    let tables: i64 = db
      .conn()
      .query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'watchlist'",
        [],
        |row| row.get(0),
      )
      .unwrap();
    assert_eq!(tables, 1);
    db.close().unwrap();
  }

  #[test]
  fn test_migrations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watchlist.db");
    Database::open(&path).unwrap().close().unwrap();
    Database::open(&path).unwrap().close().unwrap();
  }

  #[test]
  fn test_unsourced_table_is_migrated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watchlist.db");

    let conn = Connection::open(&path).unwrap();
    conn
      .execute_batch(
        "CREATE TABLE watchlist (
           user_id TEXT NOT NULL,
           anime_id INTEGER NOT NULL,
           mal_id INTEGER,
           title TEXT NOT NULL,
           image_url TEXT,
           total_episodes INTEGER,
           episodes_watched TEXT NOT NULL DEFAULT '[]',
           added_at TEXT NOT NULL,
           PRIMARY KEY (user_id, anime_id)
         );
         INSERT INTO watchlist (user_id, anime_id, title, episodes_watched, added_at)
         VALUES ('alice', 457, 'Mushishi', '[1,2]', '2024-01-01T00:00:00Z');",
      )
      .unwrap();
    conn.close().unwrap();

    let db = Database::open(&path).unwrap();
    assert!(db.has_column("watchlist", "source").unwrap());
    let (source, episodes): (String, String) = db
      .conn()
      .query_row(
        "SELECT source, episodes_watched FROM watchlist WHERE user_id = 'alice' AND anime_id = 457",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .unwrap();
    assert_eq!(source, "anilist");
    assert_eq!(episodes, "[1,2]");
    db.close().unwrap();
  }
}
