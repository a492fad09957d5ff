//! source::traits
//!
//! Trait definition for the remote issue search service.
//!
//! # Design
//!
//! The `IssueSource` trait is async because every call is network I/O.
//! All methods return `Result` so the harvester can decide, per error
//! kind, whether to retry, truncate, or give up.
//!
//! # Example
//!
//! ```ignore
//! use sonar_harvest::source::{IssueSource, IssueQuery};
//! use sonar_harvest::core::{filter::Filter, types::ProjectKey};
//!
//! async fn first_page(source: &dyn IssueSource) -> Result<(), SourceError> {
//!     let query = IssueQuery::new(ProjectKey::new("proj-a")?, Filter::default(), 500);
//!     let page = source.search_issues(&query).await?;
//!     println!("{} of {} issues", page.issues.len(), page.total);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::filter::Filter;
use crate::core::types::{Issue, ProjectKey};

/// Errors from issue source operations.
///
/// These map to the failure modes of the search API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (HTTP 429).
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error, including timeouts.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Sort field requested on every search.
///
/// Ascending creation order makes the earliest `creationDate` of a
/// ceiling-capped result the earliest issue for that filter overall.
pub const SORT_FIELD: &str = "CREATION_DATE";

/// One page request against the issue search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    /// Project to search (`componentKeys`)
    pub project: ProjectKey,
    /// Additional constraints
    pub filter: Filter,
    /// 1-based page number (`p`)
    pub page: u32,
    /// Page size (`ps`)
    pub page_size: u32,
}

impl IssueQuery {
    /// Create a query for the first page.
    pub fn new(project: ProjectKey, filter: Filter, page_size: u32) -> Self {
        Self {
            project,
            filter,
            page: 1,
            page_size,
        }
    }

    /// Full parameter list for the search request.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("componentKeys", self.project.to_string()),
            ("ps", self.page_size.to_string()),
            ("p", self.page.to_string()),
        ];
        params.extend(self.filter.query_params());
        params.push(("s", SORT_FIELD.to_string()));
        params.push(("asc", "true".to_string()));
        params
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssuePage {
    /// Issues on this page
    pub issues: Vec<Issue>,
    /// Total matches reported by the server (may exceed what is reachable)
    pub total: usize,
}

/// A project visible to the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project key
    pub key: String,
    /// Display name
    pub name: String,
}

/// The issue search service.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`.
///
/// # Error Handling
///
/// Callers should handle:
/// - `RateLimited`: back off and retry the same request
/// - `AuthRequired` / `AuthFailed`: the token is missing or rejected
/// - everything else: the request failed and will not succeed by retrying
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Get the source name (e.g., "sonarcloud").
    fn name(&self) -> &'static str;

    /// Fetch one page of issues.
    ///
    /// # Errors
    ///
    /// - `RateLimited` on HTTP 429
    /// - `ApiError` with status 400 when the page lies past the result ceiling
    async fn search_issues(&self, query: &IssueQuery) -> Result<IssuePage, SourceError>;

    /// List the projects of an organization.
    async fn list_projects(&self, organization: &str) -> Result<Vec<Project>, SourceError>;

    /// Ask the server whether the configured token is valid.
    async fn validate_token(&self) -> Result<bool, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Severity;

    #[test]
    fn query_params_include_paging_filter_and_sort() {
        let mut query = IssueQuery::new(
            ProjectKey::new("proj-a").unwrap(),
            Filter::severity(Severity::Blocker),
            500,
        );
        query.page = 3;

        assert_eq!(
            query.params(),
            vec![
                ("componentKeys", "proj-a".to_string()),
                ("ps", "500".to_string()),
                ("p", "3".to_string()),
                ("severities", "BLOCKER".to_string()),
                ("s", "CREATION_DATE".to_string()),
                ("asc", "true".to_string()),
            ]
        );
    }

    #[test]
    fn new_query_starts_at_page_one() {
        let query = IssueQuery::new(ProjectKey::new("p").unwrap(), Filter::default(), 100);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 100);
    }

    #[test]
    fn source_error_display() {
        assert_eq!(
            format!("{}", SourceError::AuthRequired),
            "authentication required"
        );
        assert_eq!(format!("{}", SourceError::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                SourceError::ApiError {
                    status: 400,
                    message: "Can return only the first 10000 results".into()
                }
            ),
            "API error: 400 - Can return only the first 10000 results"
        );
        assert_eq!(
            format!("{}", SourceError::NetworkError("timed out".into())),
            "network error: timed out"
        );
    }
}
