//! TTL caches for Gleaner.
//!
//! Generic in-memory cache with a capacity ceiling, TTL expiry, and
//! oldest-inserted-first eviction. Shared by the metadata resolver and the
//! reputation score cache.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;

pub use cache::{CacheConfig, CacheStats, KeyPolicy, TtlCache};
