//! Common traits for Gleaner.
//!
//! These traits define the seams between the caches and their data sources,
//! enabling alternate backends and deterministic tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ReputationScore;

// ═══════════════════════════════════════════════════════════════════════════════
// SCORE SOURCE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for reputation score lookups.
///
/// Implementations might use:
/// - A subgraph on the indexing service (production)
/// - A fixed table (for testing/development)
#[async_trait]
pub trait ScoreSource: Send + Sync {
    /// Fetches the score for an already-normalized identity.
    ///
    /// Returns `Ok(None)` when the identity has no reputation record, and
    /// `Err` when the lookup itself failed.
    async fn fetch_score(&self, identity: &str) -> Result<Option<ReputationScore>>;
}

#[async_trait]
impl<S: ScoreSource + ?Sized> ScoreSource for std::sync::Arc<S> {
    async fn fetch_score(&self, identity: &str) -> Result<Option<ReputationScore>> {
        (**self).fetch_score(identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Fixed(u32);

    #[async_trait]
    impl ScoreSource for Fixed {
        async fn fetch_score(&self, identity: &str) -> Result<Option<ReputationScore>> {
            Ok(Some(ReputationScore::new(identity, self.0, 0, 0, 0)))
        }
    }

    #[tokio::test]
    async fn test_arc_forwards_to_inner_source() {
        let source: Arc<dyn ScoreSource> = Arc::new(Fixed(420));
        let record = source.fetch_score("0xabc").await.unwrap().unwrap();
        assert_eq!(record.score, 420);
    }
}
