//! animedex: browse AniList and MyAnimeList (through Jikan) and keep a
//! per-user watchlist with watched-episode tracking.
//!
//! Remote calls go through `fetch::ResilientFetcher`, which serves fresh
//! responses from a bounded cache and retries transient failures with
//! exponential backoff.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod db;
pub mod display;
pub mod fetch;
pub mod logging;
pub mod text;
pub mod watchlist;
