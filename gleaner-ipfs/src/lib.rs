//! IPFS metadata resolution for Gleaner.
//!
//! Fetches JSON documents through an ordered list of gateways, each attempt
//! under its own deadline, and memoizes successes in a bounded TTL cache.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod fetcher;
mod gateway;
mod resolver;

pub use fetcher::{with_deadline, DeadlineFetcher};
pub use gateway::{Gateway, GatewayList, IpfsConfig};
pub use resolver::{GatewayFailure, MetadataResolver, ResolveOutcome};
