//! Upstream provider integration
//!
//! Every third-party API is reached through the [`Upstream`] trait: one GET,
//! one decoded JSON body, no retries and no caching. The submodules build the
//! requests for each provider and normalize their response shapes into the
//! models served to clients.

pub mod darksky;
pub mod eventbrite;
pub mod google;
pub mod hiking_project;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::UpstreamConfig;
use crate::{ExplorerError, Result};

/// The four upstream providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Geocode,
    Weather,
    Trails,
    Events,
}

impl Provider {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Provider::Geocode => "geocode",
            Provider::Weather => "weather",
            Provider::Trails => "trails",
            Provider::Events => "events",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Provider credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Where a provider expects its credential
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    None,
    /// `?{name}={key}`
    QueryParam { name: &'static str, key: ApiKey },
    /// `{endpoint}/{key}/...`
    PathSegment(ApiKey),
}

/// A fully-formed outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub provider: Provider,
    pub endpoint: String,
    pub path: Vec<String>,
    pub params: Vec<(String, String)>,
    pub credential: Credential,
}

impl UpstreamRequest {
    pub fn new(provider: Provider, endpoint: impl Into<String>) -> Self {
        Self {
            provider,
            endpoint: endpoint.into(),
            path: Vec::new(),
            params: Vec::new(),
            credential: Credential::None,
        }
    }

    #[must_use]
    pub fn path_segment(mut self, segment: impl Into<String>) -> Self {
        self.path.push(segment.into());
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Value of a query parameter, if set
    #[must_use]
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// URL and query parameters with the credential in place
    #[must_use]
    pub fn resolve(&self) -> (String, Vec<(String, String)>) {
        let mut segments: Vec<&str> = Vec::with_capacity(self.path.len() + 1);
        if let Credential::PathSegment(key) = &self.credential {
            segments.push(key.expose());
        }
        segments.extend(self.path.iter().map(String::as_str));

        let mut params = self.params.clone();
        if let Credential::QueryParam { name, key } = &self.credential {
            params.push(((*name).to_string(), key.expose().to_string()));
        }

        (join_url(&self.endpoint, &segments), params)
    }

    /// URL without the credential, safe for logs
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let mut segments: Vec<&str> = Vec::with_capacity(self.path.len() + 1);
        if let Credential::PathSegment(_) = &self.credential {
            segments.push("***");
        }
        segments.extend(self.path.iter().map(String::as_str));
        join_url(&self.endpoint, &segments)
    }
}

fn join_url(endpoint: &str, segments: &[&str]) -> String {
    if segments.is_empty() {
        return endpoint.to_string();
    }
    format!("{}/{}", endpoint.trim_end_matches('/'), segments.join("/"))
}

/// Build the credential for a provider, if one is configured
fn credential_from(key: Option<&ApiKey>, place: impl FnOnce(ApiKey) -> Credential) -> Credential {
    key.cloned().map_or(Credential::None, place)
}

/// Deserialize a provider body into its typed shape
fn decode<T: serde::de::DeserializeOwned>(provider: Provider, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| {
        ExplorerError::provider(provider.name(), format!("unexpected response shape: {e}"))
    })
}

/// Performs one outbound call and returns the decoded body
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<Value>;
}

/// [`Upstream`] backed by a shared reqwest client
pub struct HttpUpstream {
    client: Client,
}

impl HttpUpstream {
    /// Create a new client with the configured timeout
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ExplorerError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    #[instrument(
        name = "upstream_fetch",
        skip(self, request),
        fields(provider = %request.provider, url = %request.redacted_url())
    )]
    async fn fetch(&self, request: &UpstreamRequest) -> Result<Value> {
        let provider = request.provider.name();
        let (url, params) = request.resolve();

        // without_url() keeps credentials out of the error text
        let response = self
            .client
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                ExplorerError::provider(provider, format!("request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExplorerError::provider(
                provider,
                format!("unexpected status {status}"),
            ));
        }

        let body: Value = response.json().await.map_err(|e| {
            ExplorerError::provider(provider, format!("invalid body: {}", e.without_url()))
        })?;

        debug!("Upstream call succeeded");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_resolve_query_credential() {
        let request = UpstreamRequest::new(Provider::Geocode, "https://example.com/geocode/json")
            .param("address", "Boulder")
            .credential(Credential::QueryParam {
                name: "key",
                key: ApiKey::new("secret"),
            });

        let (url, params) = request.resolve();
        assert_eq!(url, "https://example.com/geocode/json");
        assert_eq!(
            params,
            vec![
                ("address".to_string(), "Boulder".to_string()),
                ("key".to_string(), "secret".to_string()),
            ]
        );
        assert!(!request.redacted_url().contains("secret"));
    }

    #[test]
    fn test_resolve_path_credential() {
        let request = UpstreamRequest::new(Provider::Weather, "https://example.com/forecast/")
            .path_segment("40.01,-105.27")
            .credential(Credential::PathSegment(ApiKey::new("secret")));

        let (url, params) = request.resolve();
        assert_eq!(url, "https://example.com/forecast/secret/40.01,-105.27");
        assert!(params.is_empty());
        assert_eq!(
            request.redacted_url(),
            "https://example.com/forecast/***/40.01,-105.27"
        );
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret");
        assert_eq!(format!("{key:?}"), "ApiKey(***)");

        let request = UpstreamRequest::new(Provider::Events, "https://example.com")
            .credential(Credential::QueryParam { name: "token", key });
        assert!(!format!("{request:?}").contains("super-secret"));
    }

    #[test]
    fn test_missing_key_sends_no_credential() {
        let credential = credential_from(None, Credential::PathSegment);
        assert_eq!(credential, Credential::None);
    }

    #[test]
    fn test_http_upstream_builds() {
        let config = UpstreamConfig::default();
        assert!(HttpUpstream::new(&config).is_ok());
    }

    /// Local stand-in for a provider, returns its base URL
    async fn serve_fixture() -> String {
        let app = Router::new()
            .route(
                "/echo",
                get(|Query(params): Query<HashMap<String, String>>| async move { Json(params) }),
            )
            .route(
                "/forecast/{key}/{coordinates}",
                get(|| async { Json(json!({ "daily": { "data": [] } })) }),
            )
            .route(
                "/fail",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
            )
            .route("/text", get(|| async { "<html>not json</html>" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(json!({}))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn upstream() -> HttpUpstream {
        HttpUpstream::new(&UpstreamConfig {
            timeout_seconds: 1,
            user_agent: "city-explorer-test".to_string(),
        })
        .unwrap()
    }

    fn keyed(base: &str, path: &str) -> UpstreamRequest {
        UpstreamRequest::new(Provider::Trails, format!("{base}{path}"))
            .param("lat", "40.01")
            .credential(Credential::QueryParam {
                name: "key",
                key: ApiKey::new("secret-key-123"),
            })
    }

    #[tokio::test]
    async fn test_fetch_sends_params_and_credential() {
        let base = serve_fixture().await;

        let body = upstream().fetch(&keyed(&base, "/echo")).await.unwrap();

        assert_eq!(body, json!({ "lat": "40.01", "key": "secret-key-123" }));
    }

    #[tokio::test]
    async fn test_fetch_path_credential() {
        let base = serve_fixture().await;
        let request = UpstreamRequest::new(Provider::Weather, format!("{base}/forecast"))
            .path_segment("40.01,-105.27")
            .credential(Credential::PathSegment(ApiKey::new("dark")));

        let body = upstream().fetch(&request).await.unwrap();

        assert_eq!(body, json!({ "daily": { "data": [] } }));
    }

    #[tokio::test]
    async fn test_fetch_failures_are_provider_errors_without_key() {
        let base = serve_fixture().await;
        let upstream = upstream();

        for path in ["/fail", "/text", "/slow"] {
            let err = upstream.fetch(&keyed(&base, path)).await.unwrap_err();
            assert!(
                matches!(err, ExplorerError::ProviderUnavailable { provider: "trails", .. }),
                "{path}: {err:?}"
            );
            assert!(!err.to_string().contains("secret-key-123"), "{path}: {err}");
            assert!(!format!("{err:?}").contains("secret-key-123"), "{path}: {err:?}");
        }
    }

    #[tokio::test]
    async fn test_fetch_unreachable_provider() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = upstream()
            .fetch(&keyed(&format!("http://{addr}"), "/echo"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExplorerError::ProviderUnavailable { .. }));
        assert!(!err.to_string().contains("secret-key-123"));
    }
}
