//! Domain types for Gleaner.
//!
//! - [`ContentRef`]: A normalized reference to content-addressed data
//! - [`ReputationScore`]: Score record for a wallet identity
//! - [`ScoreTier`]: Bucket a score falls into
//! - [`QueryOptions`]: Per-call options for indexer queries
//! - Metadata documents ([`JobMetadata`], [`ProfileMetadata`], ...)

mod content;
mod metadata;
mod query;
mod reputation;

pub use content::*;
pub use metadata::*;
pub use query::*;
pub use reputation::*;
