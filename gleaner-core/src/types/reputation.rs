//! Reputation records and derived values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ARBITRATOR_MIN_SCORE, MAX_SCORE, TIER_ELITE_MIN, TIER_ESTABLISHED_MIN, TIER_TRUSTED_MIN,
    TIER_VERIFIED_MIN, WEI_PER_SCORE_POINT,
};
use crate::error::{GleanerError, Result};

/// Normalizes a wallet identity for use as a cache or query key.
///
/// Identities are compared case-insensitively; surrounding whitespace is dropped.
pub fn normalize_identity(identity: &str) -> Result<String> {
    let normalized = identity.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(GleanerError::InvalidIdentity(
            "identity cannot be empty".into(),
        ));
    }
    Ok(normalized)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCORE TIER
// ═══════════════════════════════════════════════════════════════════════════════

/// Reputation tier derived from a score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    /// 0-299
    Newcomer,
    /// 300-499
    Trusted,
    /// 500-699
    Established,
    /// 700-899
    Verified,
    /// 900+
    Elite,
}

impl ScoreTier {
    /// Returns the tier a score falls into.
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= TIER_ELITE_MIN => ScoreTier::Elite,
            s if s >= TIER_VERIFIED_MIN => ScoreTier::Verified,
            s if s >= TIER_ESTABLISHED_MIN => ScoreTier::Established,
            s if s >= TIER_TRUSTED_MIN => ScoreTier::Trusted,
            _ => ScoreTier::Newcomer,
        }
    }

    /// Lowest score belonging to this tier.
    pub fn threshold(self) -> u32 {
        match self {
            ScoreTier::Newcomer => 0,
            ScoreTier::Trusted => TIER_TRUSTED_MIN,
            ScoreTier::Established => TIER_ESTABLISHED_MIN,
            ScoreTier::Verified => TIER_VERIFIED_MIN,
            ScoreTier::Elite => TIER_ELITE_MIN,
        }
    }

    /// Lowercase name of the tier.
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreTier::Newcomer => "newcomer",
            ScoreTier::Trusted => "trusted",
            ScoreTier::Established => "established",
            ScoreTier::Verified => "verified",
            ScoreTier::Elite => "elite",
        }
    }
}

impl fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPUTATION SCORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Reputation record for one identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationScore {
    /// Lowercase wallet address
    pub address: String,
    /// Score in `0..=MAX_SCORE`
    pub score: u32,
    /// Tier derived from `score`
    pub tier: ScoreTier,
    /// Number of endorsements received
    pub endorsements: u32,
    /// Number of airdrops claimed
    pub airdrops_received: u32,
    /// Unix seconds of the last on-chain update (0 if unknown)
    pub last_updated: u64,
}

impl ReputationScore {
    /// Builds a record, deriving the tier from the score.
    pub fn new(
        address: &str,
        score: u32,
        endorsements: u32,
        airdrops_received: u32,
        last_updated: u64,
    ) -> Self {
        let score = score.min(MAX_SCORE);
        Self {
            address: address.to_lowercase(),
            score,
            tier: ScoreTier::from_score(score),
            endorsements,
            airdrops_received,
            last_updated,
        }
    }

    /// Converts a total endorsement weight (wei) into score points, capped at [`MAX_SCORE`].
    pub fn score_from_weight(endorsement_weight_wei: u128) -> u32 {
        let points = endorsement_weight_wei / WEI_PER_SCORE_POINT;
        points.min(MAX_SCORE as u128) as u32
    }

    /// Returns the last update as a timestamp, if known.
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        if self.last_updated == 0 {
            return None;
        }
        i64::try_from(self.last_updated)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARBITRATOR ELIGIBILITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether an identity may serve as an arbitrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitratorEligibility {
    /// True if the score meets the requirement
    pub eligible: bool,
    /// Human-readable reason when not eligible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Current score (0 without a record)
    pub score: u32,
    /// Score required to be eligible
    pub required_score: u32,
    /// Current tier, if a record exists
    pub tier: Option<ScoreTier>,
    /// Points still missing
    pub missing_points: u32,
}

impl ArbitratorEligibility {
    /// Evaluates eligibility from an optional reputation record.
    pub fn evaluate(record: Option<&ReputationScore>) -> Self {
        let Some(record) = record else {
            return Self {
                eligible: false,
                reason: Some("no reputation profile".into()),
                score: 0,
                required_score: ARBITRATOR_MIN_SCORE,
                tier: None,
                missing_points: ARBITRATOR_MIN_SCORE,
            };
        };

        let eligible = record.score >= ARBITRATOR_MIN_SCORE;
        let missing_points = ARBITRATOR_MIN_SCORE.saturating_sub(record.score);

        Self {
            eligible,
            reason: (!eligible)
                .then(|| format!("score too low ({} more points needed)", missing_points)),
            score: record.score,
            required_score: ARBITRATOR_MIN_SCORE,
            tier: Some(record.tier),
            missing_points,
        }
    }
}
