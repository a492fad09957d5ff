//! source::sonarcloud
//!
//! SonarCloud / SonarQube implementation of [`IssueSource`].
//!
//! # Design
//!
//! Three Web API endpoints are used:
//! - `api/issues/search` for paged issue retrieval
//! - `api/components/search` for the project listing
//! - `api/authentication/validate` for the token pre-flight
//!
//! # Authentication
//!
//! The user token is sent as HTTP Basic credentials with an empty password.
//! It is never logged and is redacted from `Debug` output.
//!
//! # Rate Limiting
//!
//! HTTP 429 maps to `SourceError::RateLimited`. Retrying is the caller's
//! responsibility (see `harvest::executor`).
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use sonar_harvest::source::sonarcloud::SonarCloudSource;
//!
//! let source = SonarCloudSource::new("squ_xxx", "https://sonarcloud.io", Duration::from_secs(30))?;
//! let projects = source.list_projects("my-org").await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::traits::{IssuePage, IssueQuery, IssueSource, Project, SourceError};
use crate::core::types::Issue;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = concat!("sonar-harvest/", env!("CARGO_PKG_VERSION"));

/// Page size for the project listing.
const PROJECT_PAGE_SIZE: usize = 500;

/// SonarCloud / SonarQube issue source.
pub struct SonarCloudSource {
    /// HTTP client for making requests
    client: Client,
    /// User token
    token: String,
    /// Server base URL without trailing slash
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for SonarCloudSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonarCloudSource")
            .field("has_token", &!self.token.is_empty())
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl SonarCloudSource {
    /// Create a source for the given server.
    ///
    /// `timeout` applies to every request individually.
    ///
    /// # Errors
    ///
    /// - `AuthRequired` if the token is empty
    /// - `NetworkError` if the HTTP client cannot be built
    pub fn new(
        token: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let token = token.into();
        if token.is_empty() {
            return Err(SourceError::AuthRequired);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT_VALUE)
            .default_headers(headers)
            .build()
            .map_err(|e| SourceError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get the server base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build URL for an API endpoint.
    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.api_base, path)
    }

    /// Issue an authenticated GET and decode the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let response = self
            .client
            .get(self.api_url(path))
            .basic_auth(&self.token, Some(""))
            .query(params)
            .send()
            .await
            .map_err(map_transport_error)?;

        self.handle_response(response).await
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, SourceError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| SourceError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(Self::error_for_status(response, status).await)
        }
    }

    /// Map a non-success response to an error.
    async fn error_for_status(response: Response, status: StatusCode) -> SourceError {
        // The server reports {"errors": [{"msg": "..."}]}
        let message = match response.json::<SonarErrorResponse>().await {
            Ok(body) => body
                .errors
                .into_iter()
                .map(|e| e.msg)
                .collect::<Vec<_>>()
                .join("; "),
            Err(_) => String::new(),
        };
        let message = if message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        } else {
            message
        };

        match status {
            StatusCode::UNAUTHORIZED => SourceError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => {
                SourceError::AuthFailed(format!("Permission denied: {}", message))
            }
            StatusCode::NOT_FOUND => SourceError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited,
            _ if status.is_server_error() => SourceError::ApiError {
                status: status.as_u16(),
                message: format!("Server error: {}", message),
            },
            _ => SourceError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Map a reqwest transport failure.
fn map_transport_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::NetworkError(format!("request timed out: {}", err))
    } else {
        SourceError::NetworkError(err.to_string())
    }
}

#[async_trait]
impl IssueSource for SonarCloudSource {
    fn name(&self) -> &'static str {
        "sonarcloud"
    }

    async fn search_issues(&self, query: &IssueQuery) -> Result<IssuePage, SourceError> {
        let response: SearchResponse = self.get("issues/search", &query.params()).await?;

        // Newer servers report the total under `paging` only
        let total = response
            .total
            .or(response.paging.map(|p| p.total))
            .unwrap_or(response.issues.len());

        debug!(
            project = %query.project,
            page = query.page,
            received = response.issues.len(),
            total,
            "search page"
        );

        Ok(IssuePage {
            issues: response.issues,
            total,
        })
    }

    async fn list_projects(&self, organization: &str) -> Result<Vec<Project>, SourceError> {
        let mut projects = Vec::new();
        let mut page: usize = 1;

        loop {
            let params = [
                ("organization", organization.to_string()),
                ("qualifiers", "TRK".to_string()),
                ("ps", PROJECT_PAGE_SIZE.to_string()),
                ("p", page.to_string()),
            ];
            let response: ComponentsResponse = self.get("components/search", &params).await?;

            let page_count = response.components.len();
            projects.extend(response.components);

            let total = response.paging.map(|p| p.total).unwrap_or(projects.len());
            if page_count < PROJECT_PAGE_SIZE || projects.len() >= total {
                break;
            }

            page += 1;
        }

        Ok(projects)
    }

    async fn validate_token(&self) -> Result<bool, SourceError> {
        let response: ValidateResponse = self.get("authentication/validate", &[]).await?;
        Ok(response.valid)
    }
}

// --------------------------------------------------------------------------
// API Response Types
// --------------------------------------------------------------------------

/// Server error response format.
#[derive(Deserialize)]
struct SonarErrorResponse {
    #[serde(default)]
    errors: Vec<SonarErrorMessage>,
}

#[derive(Deserialize)]
struct SonarErrorMessage {
    msg: String,
}

/// Paging block shared by list endpoints.
#[derive(Deserialize)]
struct Paging {
    total: usize,
}

/// `api/issues/search` response.
#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<Issue>,
    total: Option<usize>,
    paging: Option<Paging>,
}

/// `api/components/search` response.
#[derive(Deserialize)]
struct ComponentsResponse {
    #[serde(default)]
    components: Vec<Project>,
    paging: Option<Paging>,
}

/// `api/authentication/validate` response.
#[derive(Deserialize)]
struct ValidateResponse {
    valid: bool,
}
