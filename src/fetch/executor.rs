//! The remote side of a fetch: requests, executors and their failures.

use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::cache::RequestKey;

/// A single logical query against a remote service.
///
/// `query` is whatever the executor needs to run the operation (a GraphQL
/// document, a REST path); `operation` is a short name used in logs.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
  operation: &'static str,
  query: String,
  params: Map<String, Value>,
}

impl RemoteRequest {
  pub fn new(operation: &'static str, query: impl Into<String>) -> Self {
    Self {
      operation,
      query: query.into(),
      params: Map::new(),
    }
  }

  /// Add a named parameter.
  pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
    self.params.insert(name.to_string(), value.into());
    self
  }

  pub fn operation(&self) -> &'static str {
    self.operation
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn params(&self) -> &Map<String, Value> {
    &self.params
  }

  /// Cache key for this query + parameters.
  pub fn cache_key(&self) -> RequestKey {
    RequestKey::new(&self.query, &self.params)
  }

  /// Human-readable form for logs, e.g. `trending {"page":1,"perPage":12}`.
  pub fn describe(&self) -> String {
    if self.params.is_empty() {
      self.operation.to_string()
    } else {
      format!("{} {}", self.operation, Value::Object(self.params.clone()))
    }
  }
}

/// Why a single execution of a request did not produce a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
  /// The remote reported the resource does not exist
  NotFound,
  /// The remote understood the request and refused it (e.g. GraphQL errors)
  Rejected(String),
  /// Non-success HTTP status other than not-found
  Status(u16),
  /// Connection, DNS, TLS or other transport failure
  Transport(String),
  /// The response body could not be read as JSON
  Malformed(String),
  /// The attempt did not finish within its timeout
  Timeout(Duration),
}

impl ExecError {
  /// Whether a later attempt could plausibly succeed.
  pub fn is_retryable(&self) -> bool {
    match self {
      ExecError::NotFound | ExecError::Rejected(_) => false,
      ExecError::Status(_)
      | ExecError::Transport(_)
      | ExecError::Malformed(_)
      | ExecError::Timeout(_) => true,
    }
  }
}

impl fmt::Display for ExecError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExecError::NotFound => write!(f, "not found"),
      ExecError::Rejected(reason) => write!(f, "request rejected: {}", reason),
      ExecError::Status(code) => write!(f, "HTTP error status {}", code),
      ExecError::Transport(reason) => write!(f, "transport error: {}", reason),
      ExecError::Malformed(reason) => write!(f, "malformed response: {}", reason),
      ExecError::Timeout(after) => write!(f, "timed out after {}ms", after.as_millis()),
    }
  }
}

impl std::error::Error for ExecError {}

/// Executes a `RemoteRequest` against a remote service.
///
/// Implementations perform exactly one attempt per call; retrying, timeouts
/// and caching belong to the fetcher.
pub trait QueryExecutor: Send + Sync {
  fn execute(
    &self,
    request: &RemoteRequest,
  ) -> impl Future<Output = Result<Value, ExecError>> + Send;
}
