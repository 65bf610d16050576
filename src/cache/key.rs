//! Cache keys for remote requests.

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identity of a query + parameters pair.
///
/// Parameters are a `serde_json::Map`, which keeps its keys sorted, so two
/// requests built with the same parameters in a different order produce the
/// same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
  /// Derive the key for `query` called with `params`.
  pub fn new(query: &str, params: &Map<String, Value>) -> Self {
    let input = json!({
      "query": query,
      "variables": params,
    })
    .to_string();

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    Self(hex::encode(hasher.finalize()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for RequestKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // The first 12 hex chars are plenty to tell keys apart in logs
    f.write_str(&self.0[..12.min(self.0.len())])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  #[test]
  fn test_same_request_same_key() {
    let a = RequestKey::new("getById", &params(&[("id", json!(42))]));
    let b = RequestKey::new("getById", &params(&[("id", json!(42))]));
    assert_eq!(a, b);
    assert_eq!(a.as_str().len(), 64);
  }

  #[test]
  fn test_parameter_order_does_not_matter() {
    let a = RequestKey::new(
      "search",
      &params(&[("search", json!("naruto")), ("page", json!(1))]),
    );
    let b = RequestKey::new(
      "search",
      &params(&[("page", json!(1)), ("search", json!("naruto"))]),
    );
    assert_eq!(a, b);
  }

  #[test]
  fn test_different_params_different_key() {
    let a = RequestKey::new("getById", &params(&[("id", json!(42))]));
    let b = RequestKey::new("getById", &params(&[("id", json!(43))]));
    let c = RequestKey::new("getById", &params(&[("id", json!("42"))]));
    assert_ne!(a, b);
    assert_ne!(a, c);
  }

  #[test]
  fn test_different_query_different_key() {
    let p = params(&[("page", json!(1))]);
    assert_ne!(RequestKey::new("trending", &p), RequestKey::new("popular", &p));
  }

  #[test]
  fn test_display_is_short_prefix() {
    let key = RequestKey::new("genres", &Map::new());
    assert_eq!(key.to_string().len(), 12);
    assert!(key.as_str().starts_with(&key.to_string()));
  }
}
