//! Result of a fetch.

/// What a fetch produced.
///
/// `Empty` means the remote answered that there is nothing there; `Failed`
/// means the remote could not be reached or refused the request. Callers that
/// do not care about the difference can use [`FetchOutcome::into_option`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
  /// Data from the network or a fresh cache entry
  Success(T),
  /// Nothing found
  Empty,
  /// Retries exhausted or request rejected, with the last failure reason
  Failed(String),
}

impl<T> FetchOutcome<T> {
  pub fn is_success(&self) -> bool {
    matches!(self, FetchOutcome::Success(_))
  }

  pub fn is_empty(&self) -> bool {
    matches!(self, FetchOutcome::Empty)
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, FetchOutcome::Failed(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      FetchOutcome::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn failure(&self) -> Option<&str> {
    match self {
      FetchOutcome::Failed(reason) => Some(reason),
      _ => None,
    }
  }

  /// Collapse `Empty` and `Failed` into `None`.
  pub fn into_option(self) -> Option<T> {
    match self {
      FetchOutcome::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
    match self {
      FetchOutcome::Success(data) => FetchOutcome::Success(f(data)),
      FetchOutcome::Empty => FetchOutcome::Empty,
      FetchOutcome::Failed(reason) => FetchOutcome::Failed(reason),
    }
  }

  pub fn and_then<U>(self, f: impl FnOnce(T) -> FetchOutcome<U>) -> FetchOutcome<U> {
    match self {
      FetchOutcome::Success(data) => f(data),
      FetchOutcome::Empty => FetchOutcome::Empty,
      FetchOutcome::Failed(reason) => FetchOutcome::Failed(reason),
    }
  }

  /// Return the data, or `fallback` for `Empty` and `Failed`.
  pub fn unwrap_or_else(self, fallback: impl FnOnce() -> T) -> T {
    match self {
      FetchOutcome::Success(data) => data,
      _ => fallback(),
    }
  }
}

impl<T> From<Option<T>> for FetchOutcome<T> {
  fn from(value: Option<T>) -> Self {
    match value {
      Some(data) => FetchOutcome::Success(data),
      None => FetchOutcome::Empty,
    }
  }
}
