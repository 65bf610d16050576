//! Response cache used by the resilient fetcher.
//!
//! This module provides the storage side of the fetch path:
//! - `RequestKey` derives a stable key from a query + its parameters
//! - `CacheStorage` is the seam a fetcher is constructed with
//! - `MemoryStorage` keeps responses in a bounded, least-recently-used map
//! - `NoopStorage` disables caching entirely
//!
//! Freshness (TTL) is decided by the fetcher, not by the storage: storage
//! returns whatever it holds together with the time it was stored.

mod key;
mod storage;

pub use key::RequestKey;
pub use storage::{CacheStorage, CachedResponse, MemoryStorage, NoopStorage};
