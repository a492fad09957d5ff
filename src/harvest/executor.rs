//! harvest::executor
//!
//! Runs one filtered search to completion, page by page.
//!
//! # Algorithm
//!
//! 1. Request page 1, 2, ... with a fixed page size.
//! 2. Stop when a page comes back short (or empty), when the collected
//!    issues reach the remote total, or when the next full page would pass
//!    the ceiling. A page that crosses the ceiling is rejected by the
//!    server, so the last reachable offset is the largest multiple of the
//!    page size not above it.
//! 3. Wait the courtesy delay before each follow-up page.
//! 4. On 429, wait the backoff and re-issue the same page.
//! 5. On any other error, stop and return what was collected.
//!
//! All paging state lives in [`QueryExecutor::run`]; the executor itself is
//! immutable and can be shared by every pass of a planner.

use tracing::{debug, warn};

use super::{HarvestError, HarvestSettings};
use crate::core::filter::Filter;
use crate::core::types::{Issue, ProjectKey};
use crate::source::{IssueQuery, IssueSource, SourceError};

/// Why a query stopped paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The server ran out of matches.
    Exhausted,
    /// The result ceiling was reached; more matches may exist.
    CeilingReached,
    /// A request failed; the result is partial.
    Aborted(String),
}

/// Result of one executed query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Collected issues, at most `ceiling`
    pub issues: Vec<Issue>,
    /// Last total reported by the server, if any page succeeded
    pub remote_total: Option<usize>,
    /// Why paging stopped
    pub stop: StopReason,
}

impl QueryOutcome {
    /// Whether the result is capped by the ceiling.
    pub fn saturated(&self, ceiling: usize) -> bool {
        self.stop == StopReason::CeilingReached || self.issues.len() >= ceiling
    }
}

/// Executes paged searches against an [`IssueSource`].
#[derive(Clone, Copy)]
pub struct QueryExecutor<'a> {
    source: &'a dyn IssueSource,
    settings: &'a HarvestSettings,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(source: &'a dyn IssueSource, settings: &'a HarvestSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &HarvestSettings {
        self.settings
    }

    /// Fetch every issue matching `filter` for `project`, up to the ceiling.
    ///
    /// # Errors
    ///
    /// Only `HarvestError::RateLimitExhausted`, when a retry budget is
    /// configured and one page exceeds it. Every other failure truncates.
    pub async fn run(
        &self,
        project: &ProjectKey,
        filter: &Filter,
    ) -> Result<QueryOutcome, HarvestError> {
        let ceiling = self.settings.ceiling;
        let page_size = self.settings.page_size as usize;
        let reachable = reachable_limit(ceiling, page_size);

        let mut query = IssueQuery::new(project.clone(), filter.clone(), self.settings.page_size);
        let mut issues: Vec<Issue> = Vec::new();
        let mut remote_total = None;
        let mut rate_limit_retries: u32 = 0;

        let stop = loop {
            if issues.len() >= reachable {
                break StopReason::CeilingReached;
            }

            match self.source.search_issues(&query).await {
                Ok(page) => {
                    rate_limit_retries = 0;
                    remote_total = Some(page.total);
                    let received = page.issues.len();
                    issues.extend(page.issues);

                    debug!(
                        %project,
                        %filter,
                        page = query.page,
                        received,
                        collected = issues.len(),
                        total = page.total,
                        "fetched page"
                    );

                    if received == 0 || received < page_size {
                        break StopReason::Exhausted;
                    }
                    if issues.len() >= reachable {
                        break StopReason::CeilingReached;
                    }
                    if issues.len() >= page.total {
                        break StopReason::Exhausted;
                    }

                    query.page += 1;
                    tokio::time::sleep(self.settings.page_delay).await;
                }
                Err(SourceError::RateLimited) => {
                    rate_limit_retries += 1;
                    if let Some(max) = self.settings.max_rate_limit_retries {
                        if rate_limit_retries > max {
                            return Err(HarvestError::RateLimitExhausted {
                                project: project.to_string(),
                                page: query.page,
                                retries: max,
                            });
                        }
                    }
                    debug!(
                        %project,
                        page = query.page,
                        attempt = rate_limit_retries,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(self.settings.rate_limit_backoff).await;
                }
                Err(err) => {
                    warn!(
                        %project,
                        %filter,
                        page = query.page,
                        collected = issues.len(),
                        error = %err,
                        "query aborted, keeping partial result"
                    );
                    break StopReason::Aborted(err.to_string());
                }
            }
        };

        issues.truncate(ceiling);

        Ok(QueryOutcome {
            issues,
            remote_total,
            stop,
        })
    }
}

/// Number of issues a query can collect before the next page would cross
/// `ceiling`.
fn reachable_limit(ceiling: usize, page_size: usize) -> usize {
    if page_size == 0 || ceiling < page_size {
        ceiling
    } else {
        ceiling - ceiling % page_size
    }
}
