//! Query documents and their response shapes.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use gleaner_core::error::{GleanerError, Result};
use gleaner_core::types::{normalize_identity, QueryOptions, Variables};

use crate::client::IndexerClient;

// ═══════════════════════════════════════════════════════════════════════════════
// MARKETPLACE SUBGRAPH
// ═══════════════════════════════════════════════════════════════════════════════

/// Profile document reference for one user.
pub const PROFILE_URI_QUERY: &str = r#"
  query GetUserProfileUri($id: ID!) {
    user(id: $id) {
      profileURI
    }
  }
"#;

// ═══════════════════════════════════════════════════════════════════════════════
// REPUTATION SUBGRAPH
// ═══════════════════════════════════════════════════════════════════════════════

/// Reputation record for one address.
pub const REPUTATION_USER_QUERY: &str = r#"
  query GetReputationUser($address: ID!) {
    user(id: $address) {
      id
      totalEndorsementWeight
      endorsementsReceived {
        id
      }
      lastUpdated
      registeredAt
    }
  }
"#;

/// Airdrop claims made by one address.
pub const AIRDROP_CLAIMS_QUERY: &str = r#"
  query GetAirdropClaims($address: ID!) {
    airdropClaims(where: { claimer: $address }) {
      id
    }
  }
"#;

/// `{ user: ... }` envelope shared by the per-user queries.
#[derive(Debug, Deserialize)]
pub struct UserData<U> {
    /// The user entity, absent when the address is unknown to the indexer
    pub user: Option<U>,
}

/// Marketplace user with only the profile reference selected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUser {
    /// Content reference of the profile document
    #[serde(rename = "profileURI")]
    pub profile_uri: Option<String>,
}

/// Reputation subgraph user entity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationUser {
    /// Lowercase address
    pub id: String,
    /// Total endorsement stake in wei, as a decimal string
    #[serde(default)]
    pub total_endorsement_weight: Option<String>,
    /// Endorsement entity ids
    #[serde(default)]
    pub endorsements_received: Vec<EntityId>,
    /// Unix seconds, decimal string
    #[serde(default)]
    pub last_updated: Option<String>,
    /// Unix seconds, decimal string
    #[serde(default)]
    pub registered_at: Option<String>,
}

/// `{ airdropClaims: [...] }` envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirdropClaimsData {
    /// Claim entity ids
    #[serde(default)]
    pub airdrop_claims: Vec<EntityId>,
}

/// Any entity reduced to its id.
#[derive(Debug, Deserialize)]
pub struct EntityId {
    /// Entity id
    pub id: String,
}

/// Variables for a query keyed by a single address-like id.
pub fn id_variables(name: &str, id: &str) -> Variables {
    let mut variables = Variables::new();
    variables.insert(name.to_string(), json!(id));
    variables
}

impl IndexerClient {
    /// Looks up the profile document reference for an address.
    ///
    /// Runs silently: most addresses have no profile, and older deployments
    /// of the subgraph lack the field entirely. Both come back as `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn profile_uri(&self, address: &str) -> Result<Option<String>> {
        let address = normalize_identity(address)?;
        let variables = id_variables("id", &address);

        let data: UserData<ProfileUser> =
            match self.execute(PROFILE_URI_QUERY, Some(&variables), QueryOptions::silent()).await {
                Ok(data) => data,
                Err(GleanerError::Service(msg)) => {
                    debug!(address, error = %msg, "Profile lookup rejected by indexer");
                    return Ok(None);
                }
                Err(GleanerError::NoData) => return Ok(None),
                Err(e) => return Err(e),
            };

        Ok(data
            .user
            .and_then(|u| u.profile_uri)
            .filter(|uri| !uri.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::IndexerConfig;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> IndexerClient {
        IndexerClient::with_config(IndexerConfig::new(server.uri())).unwrap()
    }

    #[test]
    fn test_reputation_user_decodes() {
        let data: UserData<ReputationUser> = serde_json::from_value(json!({
            "user": {
                "id": "0xabc",
                "totalEndorsementWeight": "250000000000000000",
                "endorsementsReceived": [{"id": "e1"}, {"id": "e2"}],
                "lastUpdated": null,
                "registeredAt": "1700000000"
            }
        }))
        .unwrap();
        let user = data.user.unwrap();
        assert_eq!(user.endorsements_received.len(), 2);
        assert_eq!(user.registered_at.as_deref(), Some("1700000000"));
        assert!(user.last_updated.is_none());
    }

    #[tokio::test]
    async fn test_profile_uri_lowercases_address() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"variables": {"id": "0xabcdef"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"user": {"profileURI": "ipfs://QmProfile"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let uri = client_for(&server).profile_uri("0xABCDEF").await.unwrap();
        assert_eq!(uri.as_deref(), Some("ipfs://QmProfile"));
    }

    #[tokio::test]
    async fn test_profile_uri_absent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"user": null}
            })))
            .mount(&server)
            .await;

        assert!(client_for(&server).profile_uri("0xabc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_uri_service_error_is_absence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{"message": "Type `User` has no field `profileURI`"}]
            })))
            .mount(&server)
            .await;

        assert!(client_for(&server).profile_uri("0xabc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_uri_transport_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).profile_uri("0xabc").await.unwrap_err();
        assert!(matches!(err, GleanerError::Transport { status: 500 }));
    }
}
