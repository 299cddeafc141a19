//! # Gleaner Core
//!
//! Core types, errors, and traits for the Gleaner resolution layer.
//!
//! This crate provides the foundational building blocks used by all other Gleaner crates:
//!
//! - **Types**: Content references, reputation records, metadata documents
//! - **Errors**: One error taxonomy shared by the indexer, gateway, and cache layers
//! - **Constants**: TTLs, capacity ceilings, gateway lists, tier thresholds
//! - **Traits**: Data-source interfaces for the caches
//!
//! ## Example
//!
//! ```rust
//! use gleaner_core::{ContentRef, ScoreTier};
//!
//! let r = ContentRef::parse("ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").unwrap();
//! assert_eq!(r.cid(), "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG");
//! assert_eq!(ScoreTier::from_score(720), ScoreTier::Verified);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{GleanerError, Result};
pub use traits::*;
pub use types::*;
