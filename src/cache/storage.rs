//! Cache storage trait and in-memory implementations.

use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::time::Instant;

use super::key::RequestKey;

/// A cached response payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
  /// The response body as received from the remote service
  pub value: Value,
  /// When the response was stored
  pub stored_at: Instant,
}

/// Trait for cache storage backends.
///
/// Implementations only hold entries; whether an entry is still fresh is the
/// caller's decision based on `stored_at`.
pub trait CacheStorage: Send + Sync {
  /// Get the entry stored under `key`, fresh or not.
  fn get(&self, key: &RequestKey) -> Result<Option<CachedResponse>>;

  /// Store `value` under `key`, replacing any previous entry.
  fn put(&self, key: &RequestKey, value: &Value, stored_at: Instant) -> Result<()>;

  /// Number of entries currently held.
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &RequestKey) -> Result<Option<CachedResponse>> {
    Ok(None) // Always miss
  }

  fn put(&self, _key: &RequestKey, _value: &Value, _stored_at: Instant) -> Result<()> {
    Ok(()) // Discard
  }

  fn len(&self) -> usize {
    0
  }
}

/// Bounded in-memory storage with least-recently-used eviction.
///
/// Both lookups and insertions count as a use. When an insertion pushes the
/// entry count past `capacity`, the least recently used entries are dropped.
///
/// Recency is tracked in a queue that is scanned on every use, so each
/// lookup costs O(capacity). Keep the capacity in the hundreds.
pub struct MemoryStorage {
  capacity: usize,
  inner: Mutex<LruMap>,
}

#[derive(Default)]
struct LruMap {
  entries: HashMap<RequestKey, CachedResponse>,
  /// Front is least recently used
  order: VecDeque<RequestKey>,
  evictions: u64,
}

impl LruMap {
  fn touch(&mut self, key: &RequestKey) {
    if let Some(pos) = self.order.iter().position(|k| k == key) {
      self.order.remove(pos);
    }
    self.order.push_back(key.clone());
  }
}

impl MemoryStorage {
  /// Create an empty storage holding at most `capacity` entries.
  ///
  /// A capacity of zero is raised to one.
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity: capacity.max(1),
      inner: Mutex::new(LruMap::default()),
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// How many entries have been dropped to stay within capacity.
  pub fn evictions(&self) -> u64 {
    self.inner.lock().map(|map| map.evictions).unwrap_or(0)
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &RequestKey) -> Result<Option<CachedResponse>> {
    let mut map = self
      .inner
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let found = map.entries.get(key).cloned();
    if found.is_some() {
      map.touch(key);
    }
    Ok(found)
  }

  fn put(&self, key: &RequestKey, value: &Value, stored_at: Instant) -> Result<()> {
    let mut map = self
      .inner
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    map.entries.insert(
      key.clone(),
      CachedResponse {
        value: value.clone(),
        stored_at,
      },
    );
    map.touch(key);

    while map.entries.len() > self.capacity {
      let Some(oldest) = map.order.pop_front() else {
        break;
      };
      if map.entries.remove(&oldest).is_some() {
        map.evictions += 1;
      }
    }

    Ok(())
  }

  fn len(&self) -> usize {
    self.inner.lock().map(|map| map.entries.len()).unwrap_or(0)
  }
}
