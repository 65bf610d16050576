//! Fetcher that combines the response cache with retrying execution.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStorage, RequestKey};

use super::executor::{ExecError, QueryExecutor, RemoteRequest};
use super::outcome::FetchOutcome;
use super::policy::RetryPolicy;

/// Read-through cache in front of a retrying query executor.
///
/// 1. Check cache - if fresh, return immediately
/// 2. Otherwise run the request, up to `max_attempts` times with backoff
/// 3. Store a successful payload and return it
///
/// Not-found answers and rejected requests are returned at once and never
/// cached. Entries are only replaced, never invalidated early.
pub struct ResilientFetcher<E, S> {
  executor: Arc<E>,
  storage: Arc<S>,
  policy: RetryPolicy,
  /// How long a stored response stays fresh
  ttl: Duration,
}

impl<E: QueryExecutor, S: CacheStorage> ResilientFetcher<E, S> {
  /// Create a fetcher owning its executor and cache storage.
  pub fn new(executor: E, storage: S, policy: RetryPolicy, ttl: Duration) -> Self {
    Self::with_shared_storage(executor, Arc::new(storage), policy, ttl)
  }

  /// Create a fetcher whose cache storage is shared with other owners.
  pub fn with_shared_storage(
    executor: E,
    storage: Arc<S>,
    policy: RetryPolicy,
    ttl: Duration,
  ) -> Self {
    Self {
      executor: Arc::new(executor),
      storage,
      policy,
      ttl,
    }
  }

  pub fn executor(&self) -> &E {
    &self.executor
  }

  pub fn storage(&self) -> &S {
    &self.storage
  }

  pub fn policy(&self) -> &RetryPolicy {
    &self.policy
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// An entry stored at `stored_at` is stale once `ttl` has fully elapsed.
  fn is_stale(&self, stored_at: Instant) -> bool {
    Instant::now().saturating_duration_since(stored_at) >= self.ttl
  }

  fn cached(&self, key: &RequestKey, request: &RemoteRequest) -> Option<Value> {
    match self.storage.get(key) {
      Ok(Some(cached)) if !self.is_stale(cached.stored_at) => {
        debug!(key = %key, request = %request.describe(), "cache hit");
        Some(cached.value)
      }
      Ok(Some(_)) => {
        debug!(key = %key, request = %request.describe(), "cache entry stale");
        None
      }
      Ok(None) => {
        debug!(key = %key, request = %request.describe(), "cache miss");
        None
      }
      Err(e) => {
        warn!(key = %key, error = %e, "cache read failed, fetching from network");
        None
      }
    }
  }

  /// Fetch the response for `request`.
  pub async fn fetch(&self, request: &RemoteRequest) -> FetchOutcome<Value> {
    let key = request.cache_key();

    if let Some(value) = self.cached(&key, request) {
      return FetchOutcome::Success(value);
    }

    let max_attempts = self.policy.max_attempts();
    let mut last_error = None;

    for attempt in 0..max_attempts {
      debug!(
        attempt = attempt + 1,
        max_attempts,
        request = %request.describe(),
        "executing remote request"
      );

      let result = match tokio::time::timeout(
        self.policy.attempt_timeout(),
        self.executor.execute(request),
      )
      .await
      {
        Ok(result) => result,
        Err(_) => Err(ExecError::Timeout(self.policy.attempt_timeout())),
      };

      match result {
        Ok(value) => {
          if let Err(e) = self.storage.put(&key, &value, Instant::now()) {
            warn!(key = %key, error = %e, "failed to store response in cache");
          }
          return FetchOutcome::Success(value);
        }
        Err(ExecError::NotFound) => {
          info!(request = %request.describe(), "not found");
          return FetchOutcome::Empty;
        }
        Err(err) if !err.is_retryable() => {
          warn!(request = %request.describe(), error = %err, "request rejected");
          return FetchOutcome::Failed(err.to_string());
        }
        Err(err) => {
          warn!(
            attempt = attempt + 1,
            request = %request.describe(),
            error = %err,
            "attempt failed"
          );
          last_error = Some(err);

          if let Some(delay) = self.policy.delay_after(attempt) {
            debug!(delay_ms = delay.as_millis() as u64, "waiting before retry");
            tokio::time::sleep(delay).await;
          }
        }
      }
    }

    let reason = last_error
      .map(|e| e.to_string())
      .unwrap_or_else(|| "no attempt was made".to_string());
    error!(
      attempts = max_attempts,
      request = %request.describe(),
      reason = %reason,
      "all retry attempts failed"
    );
    FetchOutcome::Failed(reason)
  }
}

impl<E, S> Clone for ResilientFetcher<E, S> {
  fn clone(&self) -> Self {
    Self {
      executor: Arc::clone(&self.executor),
      storage: Arc::clone(&self.storage),
      policy: self.policy,
      ttl: self.ttl,
    }
  }
}
