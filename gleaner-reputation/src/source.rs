//! Reputation scores read from the reputation subgraph.

use async_trait::async_trait;
use tracing::{debug, instrument};

use gleaner_core::error::{GleanerError, Result};
use gleaner_core::traits::ScoreSource;
use gleaner_core::types::{normalize_identity, QueryOptions, ReputationScore};
use gleaner_indexer::queries::{
    id_variables, AirdropClaimsData, ReputationUser, UserData, AIRDROP_CLAIMS_QUERY,
    REPUTATION_USER_QUERY,
};
use gleaner_indexer::IndexerClient;

/// [`ScoreSource`] backed by the reputation subgraph.
///
/// Each lookup issues the user query and the airdrop-claims query
/// concurrently and derives the score from the total endorsement weight.
#[derive(Clone)]
pub struct SubgraphScoreSource {
    client: IndexerClient,
}

impl SubgraphScoreSource {
    /// Creates a source that queries through `client`.
    ///
    /// The client must point at the reputation subgraph.
    pub fn new(client: IndexerClient) -> Self {
        Self { client }
    }

    /// The underlying indexer client.
    pub fn client(&self) -> &IndexerClient {
        &self.client
    }

    fn to_record(address: &str, user: ReputationUser, airdrops: u32) -> Result<ReputationScore> {
        let weight = match user.total_endorsement_weight.as_deref() {
            None | Some("") => 0,
            Some(raw) => raw.parse::<u128>().map_err(|_| {
                GleanerError::Parse(format!("invalid totalEndorsementWeight '{}'", raw))
            })?,
        };

        let last_updated = user
            .last_updated
            .as_deref()
            .or(user.registered_at.as_deref())
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(0);

        Ok(ReputationScore::new(
            address,
            ReputationScore::score_from_weight(weight),
            user.endorsements_received.len() as u32,
            airdrops,
            last_updated,
        ))
    }
}

#[async_trait]
impl ScoreSource for SubgraphScoreSource {
    #[instrument(skip(self))]
    async fn fetch_score(&self, identity: &str) -> Result<Option<ReputationScore>> {
        let address = normalize_identity(identity)?;
        let variables = id_variables("address", &address);

        let (user, claims) = tokio::join!(
            self.client.execute::<UserData<ReputationUser>>(
                REPUTATION_USER_QUERY,
                Some(&variables),
                QueryOptions::default(),
            ),
            self.client.execute::<AirdropClaimsData>(
                AIRDROP_CLAIMS_QUERY,
                Some(&variables),
                QueryOptions::silent(),
            ),
        );

        let Some(user) = user?.user else {
            debug!(address, "No reputation record");
            return Ok(None);
        };

        // Airdrop counts are informational; a failed claims query counts as zero
        let airdrops = match claims {
            Ok(data) => data.airdrop_claims.len() as u32,
            Err(e) => {
                debug!(address, error = %e, "Airdrop claims unavailable");
                0
            }
        };

        let record = Self::to_record(&address, user, airdrops)?;
        debug!(address, score = record.score, tier = %record.tier, "Fetched reputation score");
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gleaner_core::types::ScoreTier;
    use gleaner_indexer::IndexerConfig;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer) -> SubgraphScoreSource {
        let config = IndexerConfig::new(server.uri()).for_subgraph("shinroe");
        SubgraphScoreSource::new(IndexerClient::with_config(config).unwrap())
    }

    async fn mount_claims(server: &MockServer, count: usize) {
        let claims: Vec<_> = (0..count).map(|i| json!({"id": format!("c{}", i)})).collect();
        Mock::given(method("POST"))
            .and(body_string_contains("airdropClaims"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"airdropClaims": claims}})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_score_derives_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("GetReputationUser"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"user": {
                    "id": "0xabc",
                    "totalEndorsementWeight": "7200000000000000000",
                    "endorsementsReceived": [{"id": "e1"}, {"id": "e2"}, {"id": "e3"}],
                    "lastUpdated": null,
                    "registeredAt": "1700000000"
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_claims(&server, 2).await;

        let record = source_for(&server)
            .fetch_score("0xABC")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.address, "0xabc");
        assert_eq!(record.score, 720);
        assert_eq!(record.tier, ScoreTier::Verified);
        assert_eq!(record.endorsements, 3);
        assert_eq!(record.airdrops_received, 2);
        assert_eq!(record.last_updated, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_score_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("GetReputationUser"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"user": {"id": "0xabc", "totalEndorsementWeight": "999000000000000000000"}}
            })))
            .mount(&server)
            .await;
        mount_claims(&server, 0).await;

        let record = source_for(&server).fetch_score("0xabc").await.unwrap().unwrap();
        assert_eq!(record.score, 1000);
        assert_eq!(record.tier, ScoreTier::Elite);
    }

    #[tokio::test]
    async fn test_unknown_user_is_absence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("GetReputationUser"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"user": null}})))
            .mount(&server)
            .await;
        mount_claims(&server, 0).await;

        assert!(source_for(&server).fetch_score("0xabc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_query_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("GetReputationUser"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        mount_claims(&server, 1).await;

        let err = source_for(&server).fetch_score("0xabc").await.unwrap_err();
        assert!(matches!(err, GleanerError::Transport { status: 503 }));
    }

    #[tokio::test]
    async fn test_claims_failure_counts_as_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("GetReputationUser"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"user": {"id": "0xabc", "totalEndorsementWeight": "0"}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("airdropClaims"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let record = source_for(&server).fetch_score("0xabc").await.unwrap().unwrap();
        assert_eq!(record.airdrops_received, 0);
        assert_eq!(record.tier, ScoreTier::Newcomer);
    }
}
