//! # Gleaner Indexer
//!
//! GraphQL client for the subgraph indexing service.
//!
//! [`IndexerClient::execute`] posts a query and classifies the outcome as a
//! payload or exactly one of transport failure, service-reported error or
//! missing data.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod client;
pub mod queries;

pub use client::{IndexerClient, IndexerConfig};
