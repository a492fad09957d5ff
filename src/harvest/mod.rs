//! harvest
//!
//! The issue harvesting engine.
//!
//! # Architecture
//!
//! A harvest runs strictly sequentially, one remote request at a time:
//!
//! ```text
//! Harvester (report)            one project after another
//!   └─ CoveragePlanner          severity / type / status / cross-product passes
//!        ├─ QueryExecutor       one filter, paged up to the result ceiling
//!        └─ segment_by_date     date windows for a saturated severity
//! ```
//!
//! Every pass for a project merges into one [`SeenSet`], so a project's
//! issue list never holds the same key twice. Nothing is shared between
//! projects.
//!
//! # Failure model
//!
//! - HTTP 429 is retried in place after a fixed backoff
//! - Any other request failure truncates that one query (logged, not fatal)
//! - [`HarvestError`] aborts the harvest; issues from completed projects are
//!   returned as partial results
//! - [`RequestError`] rejects invalid input before any remote call

pub mod executor;
pub mod planner;
pub mod report;
pub mod seen;
pub mod segment;

pub use executor::{QueryExecutor, QueryOutcome, StopReason};
pub use planner::{CoveragePlanner, ProjectReport};
pub use report::{
    ExportStats, HarvestFailure, HarvestOutcome, HarvestReport, HarvestSummary, Harvester,
    PartialResults, ProjectCount,
};
pub use seen::SeenSet;
pub use segment::{segment_by_date, DateWindow};

use std::time::Duration;

use thiserror::Error;

use crate::core::config::{Config, MAX_PAGE_SIZE, SERVER_RESULT_CEILING};
use crate::core::types::{ProjectKey, TypeError};
use crate::source::sonarcloud::SonarCloudSource;
use crate::source::SourceError;

/// Errors that abort a harvest.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A page kept answering 429 past the configured retry budget.
    #[error("rate limited on {project} page {page} after {retries} retries")]
    RateLimitExhausted {
        project: String,
        page: u32,
        retries: u32,
    },

    /// A saturated query returned no usable creation date to segment from.
    #[error("{project}: query '{filter}' hit the {ceiling} result ceiling but no issue has a usable creationDate")]
    MissingCreationDate {
        project: String,
        filter: String,
        ceiling: usize,
    },

    /// The server rejected the token during the pre-flight check.
    #[error("token rejected by {0}")]
    TokenRejected(String),

    /// A source error that could not be handled locally.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Errors from validating a harvest request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("token is required")]
    MissingToken,

    #[error("at least one project key is required")]
    NoProjects,

    #[error(transparent)]
    InvalidProject(#[from] TypeError),
}

/// A validated harvest request.
///
/// # Example
///
/// ```
/// use sonar_harvest::harvest::{HarvestRequest, RequestError};
///
/// let request = HarvestRequest::new("squ_token", &["proj-a".to_string()]).unwrap();
/// assert_eq!(request.projects().len(), 1);
///
/// assert_eq!(
///     HarvestRequest::new("", &["proj-a".to_string()]).unwrap_err(),
///     RequestError::MissingToken
/// );
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct HarvestRequest {
    token: String,
    projects: Vec<ProjectKey>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for HarvestRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestRequest")
            .field("projects", &self.projects)
            .finish_non_exhaustive()
    }
}

impl HarvestRequest {
    /// Validate a token and an ordered list of project keys.
    ///
    /// # Errors
    ///
    /// - `MissingToken` if the token is empty or blank
    /// - `NoProjects` if the list is empty
    /// - `InvalidProject` if any key is malformed
    pub fn new(token: &str, project_keys: &[String]) -> Result<Self, RequestError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(RequestError::MissingToken);
        }
        if project_keys.is_empty() {
            return Err(RequestError::NoProjects);
        }

        let projects = project_keys
            .iter()
            .map(|k| ProjectKey::new(k.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            token: token.to_string(),
            projects,
        })
    }

    /// The token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Projects in request order.
    pub fn projects(&self) -> &[ProjectKey] {
        &self.projects
    }
}

/// Tuning for one harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    /// Issues per page
    pub page_size: u32,
    /// Result ceiling per query
    pub ceiling: usize,
    /// Courtesy delay between pages
    pub page_delay: Duration,
    /// Backoff after a 429
    pub rate_limit_backoff: Duration,
    /// Consecutive 429 retries allowed for one page (`None` = unbounded)
    pub max_rate_limit_retries: Option<u32>,
    /// Segmentation window width in days
    pub window_days: u32,
    /// Project size that triggers the severity x type fallback
    pub cross_product_threshold: usize,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            ceiling: SERVER_RESULT_CEILING,
            page_delay: Duration::from_millis(100),
            rate_limit_backoff: Duration::from_millis(2000),
            max_rate_limit_retries: None,
            window_days: 30,
            cross_product_threshold: 40_000,
        }
    }
}

impl HarvestSettings {
    /// Settings resolved from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.page_size(),
            ceiling: config.ceiling(),
            page_delay: config.page_delay(),
            rate_limit_backoff: config.rate_limit_backoff(),
            max_rate_limit_retries: config.max_rate_limit_retries(),
            window_days: config.window_days(),
            cross_product_threshold: config.cross_product_threshold(),
        }
    }

    /// The same settings with both pacing delays removed.
    pub fn without_delays(mut self) -> Self {
        self.page_delay = Duration::ZERO;
        self.rate_limit_backoff = Duration::ZERO;
        self
    }
}

/// Harvest the requested projects from a SonarCloud / SonarQube server.
///
/// `base_url` overrides the configured server. A client that cannot be
/// built is reported as a failure payload like any other harvest error.
pub async fn run_harvest(
    request: &HarvestRequest,
    config: &Config,
    base_url: Option<&str>,
) -> HarvestOutcome {
    let base_url = base_url.unwrap_or_else(|| config.base_url());
    let settings = HarvestSettings::from_config(config);

    match SonarCloudSource::new(request.token(), base_url, config.request_timeout()) {
        Ok(source) => {
            Harvester::new(&source, &settings)
                .harvest(request.projects())
                .await
        }
        Err(err) => HarvestOutcome::Failure(HarvestFailure::new(err.to_string(), Vec::new())),
    }
}
