//! # Gleaner Reputation
//!
//! Reputation scores with a cache-first lookup path.
//!
//! [`ReputationCache`] answers single lookups ([`ReputationCache::get_score`])
//! and batches ([`ReputationCache::get_scores`]) from a five-minute cache,
//! fetching misses through a [`ScoreSource`](gleaner_core::ScoreSource).
//! Batches fetch every miss concurrently and merge once.
//!
//! ## Example
//!
//! ```rust,ignore
//! let cache = ReputationCache::from_indexer(&IndexerConfig::from_env()?, ReputationConfig::default())?;
//! let scores = cache.get_scores(["0xabc...", "0xdef..."]).await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;
mod source;

pub use cache::{ReputationCache, ReputationConfig, ScoreMap, ScoreResult, ScoreWatch};
pub use source::SubgraphScoreSource;
