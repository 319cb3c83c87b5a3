//! GitLab pipelines API client.
//!
//! See <https://docs.gitlab.com/ee/api/pipelines.html>.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::debug;

use super::ExecutionLister;
use crate::config::{AuthStyle, GuardConfig};
use crate::core::ExecutionRecord;
use crate::errors::ApiAccessError;

/// Upper bound on a single request, so one call cannot stall the loop.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Page size requested from the pipelines endpoint.
pub const DEFAULT_PER_PAGE: u32 = 100;

const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Lists pipelines through `GET {project_api_url}/pipelines`.
pub struct GitLabLister {
    client: reqwest::Client,
    pipelines_url: String,
    credential: String,
    auth_style: AuthStyle,
    per_page: u32,
}

impl GitLabLister {
    /// Creates a lister for the given project-scoped API URL.
    pub fn new(
        project_api_url: &str,
        credential: impl Into<String>,
        auth_style: AuthStyle,
    ) -> Result<Self, ApiAccessError> {
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            pipelines_url: format!("{}/pipelines", project_api_url.trim_end_matches('/')),
            credential: credential.into(),
            auth_style,
            per_page: DEFAULT_PER_PAGE,
        })
    }

    /// Creates a lister from a validated guard configuration.
    pub fn from_config(config: &GuardConfig) -> Result<Self, ApiAccessError> {
        Self::new(config.project_api_url(), config.credential(), config.auth_style())
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Replaces the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, ApiAccessError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Returns the URL that is polled.
    #[must_use]
    pub fn pipelines_url(&self) -> &str {
        &self.pipelines_url
    }
}

impl std::fmt::Debug for GitLabLister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabLister")
            .field("pipelines_url", &self.pipelines_url)
            .field("auth_style", &self.auth_style)
            .field("per_page", &self.per_page)
            .finish_non_exhaustive()
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, ApiAccessError> {
    reqwest::Client::builder()
        .user_agent(concat!("jobguard/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| ApiAccessError::Client(e.to_string()))
}

#[async_trait]
impl ExecutionLister for GitLabLister {
    async fn list_executions(&self) -> Result<Vec<ExecutionRecord>, ApiAccessError> {
        let url = self.pipelines_url.as_str();

        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(&[("per_page", self.per_page)]);
        let request = match self.auth_style {
            AuthStyle::PrivateToken => request.header(PRIVATE_TOKEN_HEADER, &self.credential),
            AuthStyle::Bearer => request.bearer_auth(&self.credential),
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiAccessError::transport(url, format!("request timed out: {e}"))
            } else {
                ApiAccessError::transport(url, e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiAccessError::status(url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiAccessError::transport(url, e.to_string()))?;

        let records: Vec<ExecutionRecord> =
            serde_json::from_slice(&body).map_err(|e| ApiAccessError::decode(url, e.to_string()))?;

        debug!(url = %url, count = records.len(), "Fetched pipeline records");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipelines_body() -> serde_json::Value {
        serde_json::json!([
            {
                "id": 47,
                "iid": 12,
                "project_id": 7,
                "status": "running",
                "source": "push",
                "ref": "42-fix",
                "sha": "a91957a858320c0e17f3a0eca7cfacbff50ea29a",
                "web_url": "https://gitlab.example.com/group/project/-/pipelines/47"
            },
            {
                "id": 48,
                "iid": 13,
                "project_id": 7,
                "status": "success",
                "source": "push",
                "ref": "main",
                "sha": "eb94b618fb5865b26e80fdd8ae531b7a63ad851a",
                "web_url": "https://gitlab.example.com/group/project/-/pipelines/48"
            }
        ])
    }

    fn lister_for(server: &MockServer, auth_style: AuthStyle) -> GitLabLister {
        GitLabLister::new(&format!("{}/projects/7", server.uri()), "glpat-test", auth_style).unwrap()
    }

    #[tokio::test]
    async fn test_lists_records_with_private_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/7/pipelines"))
            .and(header("PRIVATE-TOKEN", "glpat-test"))
            .and(header("Accept", "application/json"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pipelines_body()))
            .expect(1)
            .mount(&server)
            .await;

        let records = lister_for(&server, AuthStyle::PrivateToken)
            .list_executions()
            .await
            .unwrap();

        assert_eq!(
            records,
            vec![
                ExecutionRecord::new(47, "42-fix", "running", "a91957a858320c0e17f3a0eca7cfacbff50ea29a"),
                ExecutionRecord::new(48, "main", "success", "eb94b618fb5865b26e80fdd8ae531b7a63ad851a"),
            ]
        );
    }

    #[tokio::test]
    async fn test_bearer_auth_and_page_size() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/7/pipelines"))
            .and(header("Authorization", "Bearer glpat-test"))
            .and(query_param("per_page", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let records = lister_for(&server, AuthStyle::Bearer)
            .with_per_page(20)
            .list_executions()
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"message":"401 Unauthorized"}"#))
            .mount(&server)
            .await;

        let err = lister_for(&server, AuthStyle::PrivateToken)
            .list_executions()
            .await
            .unwrap_err();
        assert!(matches!(err, ApiAccessError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "not a list"})))
            .mount(&server)
            .await;

        let err = lister_for(&server, AuthStyle::PrivateToken)
            .list_executions()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([]))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = lister_for(&server, AuthStyle::PrivateToken)
            .with_request_timeout(Duration::from_millis(100))
            .unwrap()
            .list_executions()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_transport_error() {
        // Nothing listens on the discard port.
        let lister = GitLabLister::new("http://127.0.0.1:9/projects/7", "t", AuthStyle::PrivateToken)
            .unwrap()
            .with_request_timeout(Duration::from_millis(500))
            .unwrap();

        let err = lister.list_executions().await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn test_pipelines_url() {
        let lister =
            GitLabLister::new("https://gitlab.example.com/api/v4/projects/7/", "t", AuthStyle::Bearer).unwrap();
        assert_eq!(
            lister.pipelines_url(),
            "https://gitlab.example.com/api/v4/projects/7/pipelines"
        );
        assert!(!format!("{lister:?}").contains("\"t\""));
    }
}
