//! Cache-first reputation lookups.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use gleaner_cache::{CacheConfig, KeyPolicy, TtlCache};
use gleaner_core::constants::{REPUTATION_SUBGRAPH, SCORE_CACHE_MAX_ENTRIES, SCORE_CACHE_TTL_SECS};
use gleaner_core::error::{GleanerError, Result};
use gleaner_core::traits::ScoreSource;
use gleaner_core::types::{normalize_identity, ArbitratorEligibility, ReputationScore};
use gleaner_indexer::{IndexerClient, IndexerConfig};

use crate::source::SubgraphScoreSource;

/// Reputation cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Name of the reputation subgraph
    pub subgraph: String,
    /// Score cache settings
    pub cache: CacheConfig,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            subgraph: REPUTATION_SUBGRAPH.into(),
            cache: CacheConfig::new(
                SCORE_CACHE_MAX_ENTRIES,
                Duration::from_secs(SCORE_CACHE_TTL_SECS),
            ),
        }
    }
}

impl ReputationConfig {
    /// Loads overrides from the environment (`REPUTATION_SUBGRAPH`).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(subgraph) = std::env::var("REPUTATION_SUBGRAPH") {
            if !subgraph.trim().is_empty() {
                config.subgraph = subgraph.trim().to_string();
            }
        }
        config
    }

    /// Sets the score cache configuration.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// State of one identity's score as seen by a consumer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// The record, if resolved and present
    pub score: Option<ReputationScore>,
    /// True while a lookup is outstanding
    pub loading: bool,
    /// Failure message of the last lookup
    pub error: Option<String>,
    /// True when retrying the failed lookup may succeed
    pub retryable: bool,
}

impl ScoreResult {
    /// A lookup is outstanding.
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Default::default()
        }
    }

    /// A settled lookup (`None` means the identity has no record).
    pub fn resolved(score: Option<ReputationScore>) -> Self {
        Self {
            score,
            ..Default::default()
        }
    }

    /// A failed lookup.
    pub fn failed(error: &GleanerError) -> Self {
        Self {
            error: Some(error.to_string()),
            retryable: error.is_recoverable(),
            ..Default::default()
        }
    }

    fn from_lookup(result: Result<Option<ReputationScore>>) -> Self {
        match result {
            Ok(score) => Self::resolved(score),
            Err(e) => Self::failed(&e),
        }
    }
}

/// Scores keyed by normalized identity.
pub type ScoreMap = HashMap<String, ScoreResult>;

/// Identity → score cache in front of a [`ScoreSource`].
///
/// Identities are trimmed and lowercased before every cache operation.
/// Only records that were actually found are cached; absences and failures
/// are looked up again on the next request.
pub struct ReputationCache {
    source: Arc<dyn ScoreSource>,
    cache: TtlCache<ReputationScore>,
}

impl ReputationCache {
    /// Creates a cache with default settings (5 minute TTL).
    pub fn new(source: Arc<dyn ScoreSource>) -> Self {
        Self::with_config(source, ReputationConfig::default().cache)
    }

    /// Creates a cache with custom settings.
    pub fn with_config(source: Arc<dyn ScoreSource>, config: CacheConfig) -> Self {
        Self {
            source,
            cache: TtlCache::with_config(config).with_key_policy(KeyPolicy::CaseInsensitive),
        }
    }

    /// Creates a cache backed by the reputation subgraph on `indexer`.
    pub fn from_indexer(indexer: &IndexerConfig, config: ReputationConfig) -> Result<Self> {
        let client = IndexerClient::with_config(indexer.for_subgraph(&config.subgraph))?;
        let source = Arc::new(SubgraphScoreSource::new(client));
        Ok(Self::with_config(source, config.cache))
    }

    /// Returns the cached record for `identity`, if live.
    pub fn cached(&self, identity: &str) -> Option<ReputationScore> {
        self.cache.get(identity)
    }

    /// Gets the score for one identity, from the cache when possible.
    #[instrument(skip(self))]
    pub async fn get_score(&self, identity: &str) -> ScoreResult {
        ScoreResult::from_lookup(self.lookup(identity).await)
    }

    /// Gets scores for many identities.
    ///
    /// Cached identities are answered immediately; every other identity is
    /// fetched concurrently and the results merged once all have settled.
    /// Duplicate and case-variant identities collapse to one key; blank ones
    /// are dropped.
    #[instrument(skip(self, identities))]
    pub async fn get_scores<I, S>(&self, identities: I) -> ScoreMap
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (mut scores, uncached) = self.partition(identities);
        scores.extend(self.fetch_all(uncached).await);
        scores
    }

    /// Opens a watch handle for one identity.
    ///
    /// A cache hit is published immediately. Otherwise the handle starts in
    /// the loading state and a background lookup publishes the outcome.
    pub fn watch_score(self: &Arc<Self>, identity: &str) -> ScoreWatch {
        let identity = identity.trim().to_lowercase();
        let initial = match normalize_identity(&identity) {
            Err(e) => ScoreResult::failed(&e),
            Ok(key) => match self.cache.get(&key) {
                Some(record) => ScoreResult::resolved(Some(record)),
                None => ScoreResult::loading(),
            },
        };

        let needs_fetch = initial.loading;
        let watch = ScoreWatch {
            cache: Arc::clone(self),
            identity,
            state: Arc::new(watch::channel(initial).0),
        };

        if needs_fetch {
            let cache = Arc::clone(&watch.cache);
            let state = Arc::clone(&watch.state);
            let identity = watch.identity.clone();
            tokio::spawn(async move {
                state.send_replace(cache.get_score(&identity).await);
            });
        }

        watch
    }

    /// Subscribes to a batch of scores.
    ///
    /// The receiver holds an initial snapshot right away: cached identities
    /// resolved, the rest loading. Once every outstanding lookup has settled
    /// the snapshot is replaced, in one step, by the fully merged map.
    pub fn subscribe_scores<I, S>(self: &Arc<Self>, identities: I) -> watch::Receiver<ScoreMap>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (initial, uncached) = self.partition(identities);
        if uncached.is_empty() {
            return watch::channel(initial).1;
        }

        let (tx, rx) = watch::channel(initial.clone());
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut merged = initial;
            merged.extend(cache.fetch_all(uncached).await);
            tx.send_replace(merged);
        });
        rx
    }

    /// Checks whether `identity` may serve as an arbitrator.
    #[instrument(skip(self))]
    pub async fn check_arbitrator_eligibility(&self, identity: &str) -> Result<ArbitratorEligibility> {
        let record = self.lookup(identity).await?;
        Ok(ArbitratorEligibility::evaluate(record.as_ref()))
    }

    /// Drops the cached record for `identity`.
    pub fn invalidate(&self, identity: &str) {
        self.cache.remove(identity);
    }

    /// Clears all cached records.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// The underlying score cache.
    pub fn cache(&self) -> &TtlCache<ReputationScore> {
        &self.cache
    }

    async fn lookup(&self, identity: &str) -> Result<Option<ReputationScore>> {
        let key = normalize_identity(identity)?;

        if let Some(record) = self.cache.get(&key) {
            debug!(identity = %key, "Cache hit");
            return Ok(Some(record));
        }

        debug!(identity = %key, "Cache miss, fetching");
        self.fetch_and_store(&key).await
    }

    async fn fetch_and_store(&self, key: &str) -> Result<Option<ReputationScore>> {
        match self.source.fetch_score(key).await {
            Ok(Some(record)) => {
                self.cache.set(key, record.clone());
                info!(identity = %key, score = record.score, "Cached reputation score");
                Ok(Some(record))
            }
            Ok(None) => {
                debug!(identity = %key, "No reputation record");
                Ok(None)
            }
            Err(e) => {
                warn!(identity = %key, error = %e, "Reputation lookup failed");
                Err(e)
            }
        }
    }

    /// Splits identities into a snapshot (cached resolved, rest loading)
    /// and the keys still to fetch.
    fn partition<I, S>(&self, identities: I) -> (ScoreMap, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut snapshot = ScoreMap::new();
        let mut uncached = Vec::new();

        for identity in identities {
            let Ok(key) = normalize_identity(identity.as_ref()) else {
                continue;
            };
            if !seen.insert(key.clone()) {
                continue;
            }
            match self.cache.get(&key) {
                Some(record) => {
                    snapshot.insert(key, ScoreResult::resolved(Some(record)));
                }
                None => {
                    snapshot.insert(key.clone(), ScoreResult::loading());
                    uncached.push(key);
                }
            }
        }

        debug!(
            cached = snapshot.len() - uncached.len(),
            uncached = uncached.len(),
            "Partitioned batch"
        );
        (snapshot, uncached)
    }

    async fn fetch_all(&self, keys: Vec<String>) -> ScoreMap {
        let results = join_all(keys.iter().map(|key| self.fetch_and_store(key))).await;
        keys.into_iter()
            .zip(results)
            .map(|(key, result)| (key, ScoreResult::from_lookup(result)))
            .collect()
    }
}

/// Live view of one identity's score.
pub struct ScoreWatch {
    cache: Arc<ReputationCache>,
    identity: String,
    state: Arc<watch::Sender<ScoreResult>>,
}

impl ScoreWatch {
    /// The identity being watched (lowercased).
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Latest published state.
    pub fn current(&self) -> ScoreResult {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ScoreResult> {
        self.state.subscribe()
    }

    /// Looks the score up again.
    ///
    /// Still consults the cache first: a live entry is republished without
    /// a fetch. On a miss the loading state is published before fetching.
    pub async fn refetch(&self) -> ScoreResult {
        if let Some(record) = self.cache.cached(&self.identity) {
            let result = ScoreResult::resolved(Some(record));
            self.state.send_replace(result.clone());
            return result;
        }

        self.state.send_replace(ScoreResult::loading());
        let result = self.cache.get_score(&self.identity).await;
        self.state.send_replace(result.clone());
        result
    }
}
