//! Indexer query wire types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-call options for indexer queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Suppress diagnostic logging of service-reported errors.
    ///
    /// Used for lookups that are expected to come back empty or to hit
    /// fields the deployed subgraph does not have yet.
    pub silent: bool,
}

impl QueryOptions {
    /// Options with diagnostics suppressed.
    pub fn silent() -> Self {
        Self { silent: true }
    }
}

/// Named query variables.
pub type Variables = Map<String, Value>;

/// Body POSTed to a GraphQL endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct GraphQLRequest<'a> {
    /// Query document
    pub query: &'a str,
    /// Named variables, omitted when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<&'a Variables>,
}

/// Envelope returned by a GraphQL endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    /// Payload, absent when the query failed outright
    pub data: Option<T>,
    /// Service-reported errors
    #[serde(default)]
    pub errors: Option<Vec<GraphQLError>>,
}

impl<T> GraphQLResponse<T> {
    /// First reported error message, if the error list is non-empty.
    pub fn first_error(&self) -> Option<&str> {
        self.errors
            .as_deref()
            .and_then(|errors| errors.first())
            .map(|e| e.message.as_str())
    }
}

/// One entry of a GraphQL `errors` list.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphQLError {
    /// Human-readable message
    pub message: String,
}
