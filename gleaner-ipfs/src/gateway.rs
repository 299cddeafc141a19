//! Gateway configuration and ordering.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use gleaner_cache::CacheConfig;
use gleaner_core::constants::{
    FALLBACK_GATEWAYS, GATEWAY_TIMEOUT_MS, GATEWAY_TOKEN_PARAM, METADATA_CACHE_MAX_ENTRIES,
    METADATA_CACHE_TTL_SECS,
};
use gleaner_core::error::{GleanerError, Result};
use gleaner_core::types::ContentRef;

/// IPFS resolution configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IpfsConfig {
    /// Dedicated gateway tried before any public one (e.g. "my-app.mypinata.cloud")
    pub preferred_gateway: Option<String>,
    /// Access token for the dedicated gateway (?pinataGatewayToken=...)
    pub gateway_token: Option<String>,
    /// Public gateways, tried in order after the preferred one
    pub fallback_gateways: Vec<String>,
    /// Budget for each gateway attempt, in milliseconds
    pub timeout_ms: u64,
    /// Metadata cache settings
    pub cache: CacheConfig,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            preferred_gateway: None,
            gateway_token: None,
            fallback_gateways: FALLBACK_GATEWAYS.iter().map(|g| g.to_string()).collect(),
            timeout_ms: GATEWAY_TIMEOUT_MS,
            cache: CacheConfig::new(
                METADATA_CACHE_MAX_ENTRIES,
                Duration::from_secs(METADATA_CACHE_TTL_SECS),
            ),
        }
    }
}

impl IpfsConfig {
    /// Creates a config with a dedicated gateway in front of the public ones.
    pub fn with_preferred_gateway(mut self, gateway_url: impl Into<String>) -> Self {
        self.preferred_gateway = Some(gateway_url.into());
        self
    }

    /// Adds an access token for the dedicated gateway.
    pub fn with_gateway_token(mut self, token: impl Into<String>) -> Self {
        self.gateway_token = Some(token.into());
        self
    }

    /// Replaces the public fallback list.
    pub fn with_fallback_gateways<I, S>(mut self, gateways: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_gateways = gateways.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the metadata cache configuration.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Per-attempt timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Loads overrides from the environment.
    ///
    /// Reads `IPFS_GATEWAY_URL`, `IPFS_GATEWAY_TOKEN` and `IPFS_TIMEOUT_MS`;
    /// anything unset keeps its default.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("IPFS_GATEWAY_URL") {
            if !url.trim().is_empty() {
                config.preferred_gateway = Some(url);
            }
        }
        config.gateway_token = std::env::var("IPFS_GATEWAY_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        if let Ok(raw) = std::env::var("IPFS_TIMEOUT_MS") {
            config.timeout_ms = raw.trim().parse().map_err(|_| {
                GleanerError::ConfigError(format!("IPFS_TIMEOUT_MS is not a number: {}", raw))
            })?;
        }

        Ok(config)
    }
}

/// A single gateway base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gateway {
    base: String,
    token: Option<String>,
    preferred: bool,
}

impl Gateway {
    fn parse(raw: &str, token: Option<&str>, preferred: bool) -> Result<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        let base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        Url::parse(&base)
            .map_err(|e| GleanerError::ConfigError(format!("invalid gateway '{}': {}", raw, e)))?;

        Ok(Self {
            base,
            token: token.map(str::to_string),
            preferred,
        })
    }

    /// Base URL without trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// True for the operator-configured gateway.
    pub fn is_preferred(&self) -> bool {
        self.preferred
    }

    /// Full request URL for a reference on this gateway.
    ///
    /// The access token, if any, is appended as a percent-encoded query pair.
    pub fn url_for(&self, reference: &ContentRef) -> Result<String> {
        let mut url = Url::parse(&reference.gateway_url(&self.base)).map_err(|e| {
            GleanerError::InvalidReference(format!("cannot build URL for '{}': {}", reference, e))
        })?;
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair(GATEWAY_TOKEN_PARAM, token);
        }
        Ok(url.into())
    }
}

/// Ordered gateway list: the preferred gateway (if any) followed by the
/// fallbacks in declared order.
#[derive(Clone, Debug)]
pub struct GatewayList {
    gateways: Vec<Gateway>,
}

impl GatewayList {
    /// Builds the list from configuration.
    ///
    /// The token applies to the preferred gateway only.
    pub fn from_config(config: &IpfsConfig) -> Result<Self> {
        let mut gateways = Vec::with_capacity(config.fallback_gateways.len() + 1);

        if let Some(preferred) = &config.preferred_gateway {
            gateways.push(Gateway::parse(
                preferred,
                config.gateway_token.as_deref(),
                true,
            )?);
        }
        for fallback in &config.fallback_gateways {
            gateways.push(Gateway::parse(fallback, None, false)?);
        }

        if gateways.is_empty() {
            return Err(GleanerError::ConfigError(
                "at least one IPFS gateway is required".into(),
            ));
        }

        Ok(Self { gateways })
    }

    /// Iterates gateways in attempt order.
    pub fn iter(&self) -> impl Iterator<Item = &Gateway> {
        self.gateways.iter()
    }

    /// Number of gateways.
    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    /// Always false; construction rejects an empty list.
    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}
