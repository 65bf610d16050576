/// Watchlist schema. `episodes_watched` holds an ascending JSON array and
/// `source` names the catalog `anime_id` comes from.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS watchlist (
    user_id TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT 'anilist',
    anime_id INTEGER NOT NULL,
    mal_id INTEGER,
    title TEXT NOT NULL,
    image_url TEXT,
    total_episodes INTEGER,
    episodes_watched TEXT NOT NULL DEFAULT '[]',
    added_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    PRIMARY KEY (user_id, source, anime_id)
);

CREATE INDEX IF NOT EXISTS idx_watchlist_added
    ON watchlist(user_id, added_at);
"#;

/// Rebuilds a watchlist table created before records carried a source.
/// Existing rows were all keyed by AniList id.
pub const ADD_SOURCE: &str = r#"
BEGIN;
ALTER TABLE watchlist RENAME TO watchlist_unsourced;
DROP INDEX IF EXISTS idx_watchlist_added;

CREATE TABLE watchlist (
    user_id TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT 'anilist',
    anime_id INTEGER NOT NULL,
    mal_id INTEGER,
    title TEXT NOT NULL,
    image_url TEXT,
    total_episodes INTEGER,
    episodes_watched TEXT NOT NULL DEFAULT '[]',
    added_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    PRIMARY KEY (user_id, source, anime_id)
);

INSERT INTO watchlist
    (user_id, source, anime_id, mal_id, title, image_url, total_episodes, episodes_watched, added_at)
SELECT user_id, 'anilist', anime_id, mal_id, title, image_url, total_episodes, episodes_watched, added_at
FROM watchlist_unsourced;

DROP TABLE watchlist_unsourced;

CREATE INDEX idx_watchlist_added
    ON watchlist(user_id, added_at);
COMMIT;
"#;
