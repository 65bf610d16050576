//! Resilient remote fetching.
//!
//! A `ResilientFetcher` sits between a catalog client and its `QueryExecutor`:
//! it answers from the response cache while an entry is fresh, otherwise calls
//! the executor with a per-attempt timeout and retries transient failures
//! with exponential backoff. Every call ends in a `FetchOutcome` value; the
//! fetcher never returns an error to its caller.

mod executor;
mod fetcher;
mod outcome;
mod policy;

pub use executor::{ExecError, QueryExecutor, RemoteRequest};
pub use fetcher::ResilientFetcher;
pub use outcome::FetchOutcome;
pub use policy::RetryPolicy;
