//! Everything a command needs, built once from configuration.

use color_eyre::{eyre::eyre, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use crate::cache::{CacheStorage, MemoryStorage};
use crate::catalog::{AniListClient, AniListExecutor, JikanClient, JikanExecutor};
use crate::config::Config;
use crate::db::Database;
use crate::fetch::ResilientFetcher;
use crate::watchlist::WatchlistStore;

const USER_AGENT: &str = concat!("animedex/", env!("CARGO_PKG_VERSION"));

pub struct Context {
  pub anilist: AniListClient,
  pub jikan: JikanClient,
  pub watchlist: WatchlistStore,
  pub user: String,
}

impl Context {
  /// Build the HTTP client, both catalog clients with their caches and the
  /// watchlist store. `user` overrides the configured watchlist user.
  pub fn init(config: &Config, user: Option<String>) -> Result<Self> {
    let http = Client::builder()
      .user_agent(USER_AGENT)
      .connect_timeout(Duration::from_secs(5))
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    let anilist = AniListClient::new(ResilientFetcher::new(
      AniListExecutor::new(http.clone(), config.anilist.endpoint()?),
      MemoryStorage::new(config.cache.capacity),
      config.anilist.policy(),
      config.anilist.ttl(),
    ));

    let jikan = JikanClient::new(ResilientFetcher::new(
      JikanExecutor::new(http, config.jikan.base_url()?),
      MemoryStorage::new(config.cache.capacity),
      config.jikan.policy(),
      config.jikan.ttl(),
    ));

    let path = config.watchlist_path()?;
    let watchlist = WatchlistStore::new(Database::open(&path)?);

    let user = user.unwrap_or_else(|| config.watchlist.user.clone());
    info!(user = %user, watchlist = %path.display(), "context ready");

    Ok(Self {
      anilist,
      jikan,
      watchlist,
      user,
    })
  }

  /// Log cache statistics and close the watchlist database.
  pub fn shutdown(self) -> Result<()> {
    for (name, storage) in [
      ("anilist", self.anilist.fetcher().storage()),
      ("jikan", self.jikan.fetcher().storage()),
    ] {
      info!(
        cache = name,
        entries = storage.len(),
        evictions = storage.evictions(),
        "cache statistics"
      );
    }

    self.watchlist.close()
  }
}
