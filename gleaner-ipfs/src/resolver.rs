//! Gateway fallback resolver for IPFS metadata.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use gleaner_cache::TtlCache;
use gleaner_core::error::{GleanerError, Result};
use gleaner_core::types::ContentRef;

use crate::fetcher::DeadlineFetcher;
use crate::gateway::{GatewayList, IpfsConfig};

/// A failed attempt against one gateway.
#[derive(Debug)]
pub struct GatewayFailure {
    /// Gateway base URL
    pub gateway: String,
    /// Why the attempt failed
    pub error: GleanerError,
}

/// Outcome of a resolution with diagnostics.
#[derive(Debug, Default)]
pub struct ResolveOutcome {
    /// Bare CID the reference normalized to (None if the reference was invalid)
    pub cid: Option<String>,
    /// Resolved document, if any gateway (or the cache) produced one
    pub document: Option<Value>,
    /// Whether the document came from the cache
    pub from_cache: bool,
    /// Gateway that served the document
    pub gateway: Option<String>,
    /// Failed attempts, in attempt order
    pub failures: Vec<GatewayFailure>,
}

impl ResolveOutcome {
    /// Converts to a `Result`, collapsing every failure into `NotFound`.
    pub fn into_result(self) -> Result<Value> {
        match self.document {
            Some(document) => Ok(document),
            None => {
                let cid = self.cid.unwrap_or_default();
                let reasons: Vec<String> = self
                    .failures
                    .iter()
                    .map(|f| format!("{}: {}", f.gateway, f.error))
                    .collect();
                Err(GleanerError::NotFound(if reasons.is_empty() {
                    cid
                } else {
                    format!("{} ({})", cid, reasons.join("; "))
                }))
            }
        }
    }
}

/// Resolves content references to JSON documents.
///
/// Resolution order:
/// 1. Normalize the reference to a bare CID
/// 2. Return a live cache entry without touching the network
/// 3. Try the preferred gateway, then each fallback in declared order,
///    each attempt bounded by the per-attempt timeout
/// 4. Cache and return the first document that parses
///
/// If every gateway fails the result is `None`; individual gateway
/// failures never reach the caller except through [`ResolveOutcome`].
pub struct MetadataResolver {
    fetcher: DeadlineFetcher,
    gateways: GatewayList,
    cache: Arc<TtlCache<Value>>,
    timeout: Duration,
}

impl MetadataResolver {
    /// Creates a resolver with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(IpfsConfig::default())
    }

    /// Creates a resolver with its own cache.
    pub fn with_config(config: IpfsConfig) -> Result<Self> {
        let cache = Arc::new(TtlCache::with_config(config.cache.clone()));
        Self::with_cache(config, cache)
    }

    /// Creates a resolver sharing an existing cache.
    pub fn with_cache(config: IpfsConfig, cache: Arc<TtlCache<Value>>) -> Result<Self> {
        Ok(Self {
            fetcher: DeadlineFetcher::new()?,
            gateways: GatewayList::from_config(&config)?,
            cache,
            timeout: config.timeout(),
        })
    }

    /// Resolves a reference to a JSON document.
    ///
    /// Returns `None` for invalid references and when every gateway failed.
    pub async fn resolve_metadata(&self, reference: &str) -> Option<Value> {
        self.resolve_detailed(reference).await.document
    }

    /// Resolves a reference and deserializes it into `T`.
    ///
    /// A document that does not match `T` resolves to `None`.
    pub async fn resolve_as<T: DeserializeOwned>(&self, reference: &str) -> Option<T> {
        let document = self.resolve_metadata(reference).await?;
        match serde_json::from_value(document) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(reference, error = %e, "Document does not match expected shape");
                None
            }
        }
    }

    /// Resolves a reference, reporting cache status and per-gateway failures.
    #[instrument(skip(self))]
    pub async fn resolve_detailed(&self, reference: &str) -> ResolveOutcome {
        let content_ref = match ContentRef::parse(reference) {
            Ok(r) => r,
            Err(e) => {
                debug!(reference, error = %e, "Unresolvable reference");
                return ResolveOutcome::default();
            }
        };
        let cid = content_ref.cid().to_string();

        if let Some(document) = self.cache.get(&cid) {
            debug!(cid, "Cache hit");
            return ResolveOutcome {
                cid: Some(cid),
                document: Some(document),
                from_cache: true,
                ..Default::default()
            };
        }

        debug!(cid, "Cache miss, resolving");

        let mut failures = Vec::new();
        for gateway in self.gateways.iter() {
            let attempt = match gateway.url_for(&content_ref) {
                Ok(url) => self.fetcher.fetch_json(&url, self.timeout).await,
                Err(e) => Err(e),
            };
            match attempt {
                Ok(document) => {
                    // Only a confirmed, parsed document is ever cached
                    self.cache.set(&cid, document.clone());
                    info!(cid, gateway = gateway.base(), "Resolved metadata");
                    return ResolveOutcome {
                        cid: Some(cid),
                        document: Some(document),
                        from_cache: false,
                        gateway: Some(gateway.base().to_string()),
                        failures,
                    };
                }
                Err(e) => {
                    warn!(
                        cid,
                        gateway = gateway.base(),
                        preferred = gateway.is_preferred(),
                        error = %e,
                        "Gateway failed"
                    );
                    failures.push(GatewayFailure {
                        gateway: gateway.base().to_string(),
                        error: e,
                    });
                }
            }
        }

        warn!(cid, attempts = failures.len(), "All gateways failed");
        ResolveOutcome {
            cid: Some(cid),
            failures,
            ..Default::default()
        }
    }

    /// Gateways in attempt order.
    pub fn gateways(&self) -> &GatewayList {
        &self.gateways
    }

    /// The metadata cache.
    pub fn cache(&self) -> &TtlCache<Value> {
        &self.cache
    }

    /// Drops a cached document.
    pub fn invalidate(&self, reference: &str) {
        if let Ok(r) = ContentRef::parse(reference) {
            self.cache.remove(r.cid());
        }
    }

    /// Clears the resolution cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
