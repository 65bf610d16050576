use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::catalog::{anilist, jikan};
use crate::fetch::RetryPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub anilist: AniListConfig,
  pub jikan: JikanConfig,
  pub cache: CacheConfig,
  pub watchlist: WatchlistConfig,
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AniListConfig {
  pub url: String,
  pub max_attempts: u32,
  pub base_delay_ms: u64,
  pub timeout_secs: u64,
  pub ttl_secs: u64,
}

impl Default for AniListConfig {
  fn default() -> Self {
    let policy = anilist::default_policy();
    Self {
      url: anilist::DEFAULT_ENDPOINT.to_string(),
      max_attempts: policy.max_attempts(),
      base_delay_ms: policy.base_delay().as_millis() as u64,
      timeout_secs: policy.attempt_timeout().as_secs(),
      ttl_secs: anilist::DEFAULT_TTL.as_secs(),
    }
  }
}

impl AniListConfig {
  pub fn endpoint(&self) -> Result<Url> {
    parse_url("anilist.url", &self.url)
  }

  pub fn policy(&self) -> RetryPolicy {
    policy(self.max_attempts, self.base_delay_ms, self.timeout_secs)
  }

  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JikanConfig {
  pub url: String,
  pub max_attempts: u32,
  pub base_delay_ms: u64,
  pub timeout_secs: u64,
  pub ttl_secs: u64,
}

impl Default for JikanConfig {
  fn default() -> Self {
    let policy = jikan::default_policy();
    Self {
      url: jikan::DEFAULT_BASE_URL.to_string(),
      max_attempts: policy.max_attempts(),
      base_delay_ms: policy.base_delay().as_millis() as u64,
      timeout_secs: policy.attempt_timeout().as_secs(),
      ttl_secs: jikan::DEFAULT_TTL.as_secs(),
    }
  }
}

impl JikanConfig {
  pub fn base_url(&self) -> Result<Url> {
    parse_url("jikan.url", &self.url)
  }

  pub fn policy(&self) -> RetryPolicy {
    policy(self.max_attempts, self.base_delay_ms, self.timeout_secs)
  }

  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Maximum number of responses kept per catalog
  pub capacity: usize,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self { capacity: 512 }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchlistConfig {
  /// Database file (defaults to the platform data directory)
  pub path: Option<PathBuf>,
  /// Whose watchlist to use when `--user` is not given
  pub user: String,
}

impl Default for WatchlistConfig {
  fn default() -> Self {
    Self {
      path: None,
      user: "local".to_string(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Directory for log files (defaults to the platform data directory)
  pub dir: Option<PathBuf>,
}

fn policy(max_attempts: u32, base_delay_ms: u64, timeout_secs: u64) -> RetryPolicy {
  RetryPolicy::new(
    max_attempts,
    Duration::from_millis(base_delay_ms),
    Duration::from_secs(timeout_secs),
  )
}

fn parse_url(field: &str, raw: &str) -> Result<Url> {
  Url::parse(raw).map_err(|e| eyre!("Invalid {} '{}': {}", field, raw, e))
}

fn data_dir() -> Result<PathBuf> {
  dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .map(|p| p.join("animedex"))
    .ok_or_else(|| eyre!("Could not determine data directory"))
}

impl Config {
  /// Load configuration from file, falling back to defaults.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./animedex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/animedex/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("animedex.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("animedex").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  /// Parse YAML. An empty document yields the defaults.
  pub fn parse(contents: &str) -> Result<Self> {
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  pub fn validate(&self) -> Result<()> {
    if self.anilist.max_attempts == 0 {
      return Err(eyre!("anilist.max_attempts must be at least 1"));
    }
    if self.jikan.max_attempts == 0 {
      return Err(eyre!("jikan.max_attempts must be at least 1"));
    }
    if self.cache.capacity == 0 {
      return Err(eyre!("cache.capacity must be at least 1"));
    }
    if self.watchlist.user.trim().is_empty() {
      return Err(eyre!("watchlist.user must not be empty"));
    }
    self.anilist.endpoint()?;
    self.jikan.base_url()?;
    Ok(())
  }

  /// Watchlist database file.
  pub fn watchlist_path(&self) -> Result<PathBuf> {
    match &self.watchlist.path {
      Some(path) => Ok(path.clone()),
      None => Ok(data_dir()?.join("watchlist.db")),
    }
  }

  /// Directory receiving the rolling log files.
  pub fn log_dir(&self) -> Result<PathBuf> {
    match &self.log.dir {
      Some(dir) => Ok(dir.clone()),
      None => Ok(data_dir()?.join("logs")),
    }
  }
}
