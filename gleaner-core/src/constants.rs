//! Protocol and policy constants for Gleaner.
//!
//! Cache lifetimes, capacity ceilings, gateway lists, and reputation
//! thresholds live here so that every crate agrees on them.

// ═══════════════════════════════════════════════════════════════════════════════
// METADATA RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Lifetime of a resolved metadata document in the cache (10 minutes).
pub const METADATA_CACHE_TTL_SECS: u64 = 10 * 60;

/// Maximum number of metadata documents held in memory.
pub const METADATA_CACHE_MAX_ENTRIES: usize = 500;

/// Wall-clock budget for a single gateway attempt.
pub const GATEWAY_TIMEOUT_MS: u64 = 8_000;

/// Public gateways tried, in order, after the preferred gateway.
pub const FALLBACK_GATEWAYS: &[&str] = &[
    "https://gateway.pinata.cloud",
    "https://ipfs.io",
    "https://cloudflare-ipfs.com",
    "https://dweb.link",
];

/// Scheme prefixes stripped from a content reference to get the bare CID.
pub const CONTENT_REF_PREFIXES: &[&str] = &["ipfs://", "/ipfs/", "ipfs/"];

/// Query parameter carrying the access token for a dedicated gateway.
pub const GATEWAY_TOKEN_PARAM: &str = "pinataGatewayToken";

// ═══════════════════════════════════════════════════════════════════════════════
// INDEXER
// ═══════════════════════════════════════════════════════════════════════════════

/// Environment variable holding the indexer base URL (required).
pub const INDEXER_URL_ENV: &str = "INDEXER_URL";

/// Subgraph holding jobs, users and profiles.
pub const MARKETPLACE_SUBGRAPH: &str = "pumasi";

/// Subgraph holding endorsements and airdrop claims.
pub const REPUTATION_SUBGRAPH: &str = "shinroe";

/// Default HTTP timeout for indexer queries.
pub const INDEXER_TIMEOUT_SECS: u64 = 30;

// ═══════════════════════════════════════════════════════════════════════════════
// REPUTATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Lifetime of a cached reputation score (5 minutes).
pub const SCORE_CACHE_TTL_SECS: u64 = 5 * 60;

/// Maximum number of cached reputation scores.
pub const SCORE_CACHE_MAX_ENTRIES: usize = 1_000;

/// Endorsement weight (in wei) worth one score point: 0.1 token = 10 points.
pub const WEI_PER_SCORE_POINT: u128 = 10_000_000_000_000_000;

/// Upper bound for a reputation score.
pub const MAX_SCORE: u32 = 1_000;

/// Lowest score of the "trusted" tier.
pub const TIER_TRUSTED_MIN: u32 = 300;

/// Lowest score of the "established" tier.
pub const TIER_ESTABLISHED_MIN: u32 = 500;

/// Lowest score of the "verified" tier.
pub const TIER_VERIFIED_MIN: u32 = 700;

/// Lowest score of the "elite" tier.
pub const TIER_ELITE_MIN: u32 = 900;

/// Minimum score required to serve as an arbitrator.
pub const ARBITRATOR_MIN_SCORE: u32 = TIER_VERIFIED_MIN;

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILE-TIME CHECKS
// ═══════════════════════════════════════════════════════════════════════════════

const _: () = {
    assert!(TIER_TRUSTED_MIN < TIER_ESTABLISHED_MIN);
    assert!(TIER_ESTABLISHED_MIN < TIER_VERIFIED_MIN);
    assert!(TIER_VERIFIED_MIN < TIER_ELITE_MIN);
    assert!(TIER_ELITE_MIN <= MAX_SCORE);
    assert!(SCORE_CACHE_TTL_SECS < METADATA_CACHE_TTL_SECS);
};
