//! Subgraph client for the indexing service.
//!
//! Every operation is a GraphQL POST against
//! `<base>/subgraphs/name/<subgraph>`. The response envelope is decoded in
//! two steps so that a reported `errors` list always wins over a `data`
//! payload that would not fit the caller's type.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use gleaner_core::constants::{INDEXER_TIMEOUT_SECS, INDEXER_URL_ENV, MARKETPLACE_SUBGRAPH};
use gleaner_core::error::{GleanerError, Result};
use gleaner_core::types::{GraphQLRequest, GraphQLResponse, QueryOptions, Variables};

/// Indexer client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Indexing service base URL (e.g. "https://indexer.example.com")
    pub base_url: String,
    /// Subgraph name appended to the base URL
    pub subgraph: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl IndexerConfig {
    /// Creates a configuration for the marketplace subgraph.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            subgraph: MARKETPLACE_SUBGRAPH.into(),
            timeout_seconds: INDEXER_TIMEOUT_SECS,
        }
    }

    /// Loads the configuration from the environment.
    ///
    /// `INDEXER_URL` is required. `INDEXER_SUBGRAPH` overrides the default
    /// subgraph name.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(INDEXER_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                GleanerError::ConfigError(format!("{} environment variable is not set", INDEXER_URL_ENV))
            })?;

        let mut config = Self::new(base_url.trim());
        if let Ok(subgraph) = std::env::var("INDEXER_SUBGRAPH") {
            if !subgraph.trim().is_empty() {
                config.subgraph = subgraph.trim().to_string();
            }
        }
        Ok(config)
    }

    /// Same service, different subgraph.
    pub fn for_subgraph(&self, subgraph: impl Into<String>) -> Self {
        Self {
            subgraph: subgraph.into(),
            ..self.clone()
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = timeout.as_secs().max(1);
        self
    }

    /// Full GraphQL endpoint URL.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/subgraphs/name/{}",
            self.base_url.trim_end_matches('/'),
            self.subgraph
        )
    }
}

/// GraphQL client for one subgraph.
#[derive(Clone)]
pub struct IndexerClient {
    config: IndexerConfig,
    endpoint: String,
    http_client: reqwest::Client,
}

impl IndexerClient {
    /// Creates a client with custom configuration.
    pub fn with_config(config: IndexerConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GleanerError::ConfigError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint(),
            config,
            http_client,
        })
    }

    /// Creates a client from the environment (see [`IndexerConfig::from_env`]).
    pub fn from_env() -> Result<Self> {
        Self::with_config(IndexerConfig::from_env()?)
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// The GraphQL endpoint this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Executes a query and decodes its `data` payload into `T`.
    ///
    /// # Errors
    ///
    /// - [`GleanerError::Transport`] for a non-success HTTP status
    /// - [`GleanerError::Service`] with the first message of a non-empty `errors` list
    /// - [`GleanerError::NoData`] when the envelope carries no payload
    /// - [`GleanerError::Network`] / [`GleanerError::Timeout`] when the request never completed
    /// - [`GleanerError::Parse`] for a body that is not a GraphQL envelope or a payload
    ///   that does not fit `T`
    #[instrument(skip(self, query, variables), fields(endpoint = %self.endpoint))]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<&Variables>,
        options: QueryOptions,
    ) -> Result<T> {
        let request = GraphQLRequest { query, variables };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Indexer returned non-success status");
            return Err(GleanerError::Transport {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        let envelope: GraphQLResponse<Value> = serde_json::from_slice(&body)?;

        if let Some(message) = envelope.first_error() {
            if !options.silent {
                error!(error = %message, "Indexer query failed");
            }
            return Err(GleanerError::Service(message.to_string()));
        }

        match envelope.data {
            Some(Value::Null) | None => Err(GleanerError::NoData),
            Some(data) => {
                debug!(bytes = body.len(), "Indexer query succeeded");
                Ok(serde_json::from_value(data)?)
            }
        }
    }

    fn request_error(&self, e: reqwest::Error) -> GleanerError {
        if e.is_timeout() {
            GleanerError::Timeout {
                millis: self.config.timeout_seconds * 1000,
            }
        } else {
            GleanerError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SUBGRAPH_PATH: &str = "/subgraphs/name/pumasi";

    /// Counts ERROR-level events.
    #[derive(Clone, Default)]
    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[derive(Debug, Deserialize)]
    struct UsersData {
        users: Vec<UserRow>,
    }

    #[derive(Debug, Deserialize)]
    struct UserRow {
        id: String,
    }

    fn client_for(server: &MockServer) -> IndexerClient {
        IndexerClient::with_config(IndexerConfig::new(server.uri())).unwrap()
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = IndexerConfig::new("https://indexer.example.com/");
        assert_eq!(
            config.endpoint(),
            "https://indexer.example.com/subgraphs/name/pumasi"
        );
        assert_eq!(
            config.for_subgraph("shinroe").endpoint(),
            "https://indexer.example.com/subgraphs/name/shinroe"
        );
    }

    #[test]
    fn test_from_env_requires_base_url() {
        // Only this test touches INDEXER_URL
        std::env::remove_var(INDEXER_URL_ENV);
        assert!(matches!(
            IndexerConfig::from_env(),
            Err(GleanerError::ConfigError(_))
        ));

        std::env::set_var(INDEXER_URL_ENV, "http://localhost:8000");
        let config = IndexerConfig::from_env().unwrap();
        assert_eq!(config.endpoint(), "http://localhost:8000/subgraphs/name/pumasi");
        std::env::remove_var(INDEXER_URL_ENV);
    }

    #[tokio::test]
    async fn test_execute_success_with_variables() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SUBGRAPH_PATH))
            .and(body_partial_json(json!({"variables": {"first": 2}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"users": [{"id": "0xa"}, {"id": "0xb"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut variables = Variables::new();
        variables.insert("first".into(), json!(2));

        let data: UsersData = client_for(&server)
            .execute("query($first: Int!) { users(first: $first) { id } }", Some(&variables), QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(data.users.len(), 2);
        assert_eq!(data.users[1].id, "0xb");
    }

    #[tokio::test]
    async fn test_execute_non_success_status_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .execute::<Value>("{ users { id } }", None, QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GleanerError::Transport { status: 502 }));
        assert!(err.is_transport());
        assert!(!err.is_service_error());
    }

    #[tokio::test]
    async fn test_execute_service_error_takes_first_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"users": "not-a-list"},
                "errors": [{"message": "Type `Query` has no field `userz`"}, {"message": "second"}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .execute::<UsersData>("{ userz { id } }", None, QueryOptions::default())
            .await
            .unwrap_err();
        match err {
            GleanerError::Service(msg) => assert_eq!(msg, "Type `Query` has no field `userz`"),
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_missing_data_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .execute::<Value>("{ users { id } }", None, QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GleanerError::NoData));
    }

    #[tokio::test]
    async fn test_execute_empty_errors_list_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"users": []},
                "errors": []
            })))
            .mount(&server)
            .await;

        let data: UsersData = client_for(&server)
            .execute("{ users { id } }", None, QueryOptions::default())
            .await
            .unwrap();
        assert!(data.users.is_empty());
    }

    #[tokio::test]
    async fn test_execute_undecodable_body_is_parse() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .execute::<Value>("{ users { id } }", None, QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GleanerError::Parse(_)));
    }

    #[tokio::test]
    async fn test_execute_connection_refused_is_network() {
        let client = IndexerClient::with_config(IndexerConfig::new("http://127.0.0.1:9")).unwrap();
        let err = client
            .execute::<Value>("{ users { id } }", None, QueryOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_silent_suppresses_error_log() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{"message": "boom"}]
            })))
            .mount(&server)
            .await;
        let client = client_for(&server);

        let counter = ErrorCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let err = client
            .execute::<Value>("{ x }", None, QueryOptions::silent())
            .await
            .unwrap_err();
        assert!(err.is_service_error());
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);

        let err = client
            .execute::<Value>("{ x }", None, QueryOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_service_error());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
