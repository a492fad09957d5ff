//! harvest::planner
//!
//! Chooses the queries that together cover a project's full issue set.
//!
//! # Passes
//!
//! Every pass merges into the same [`SeenSet`], in this order:
//!
//! 1. One query per severity. A severity that reaches the ceiling is
//!    replaced by date-range segmentation seeded at its earliest creation
//!    date.
//! 2. One query per type.
//! 3. One query per status.
//! 4. For very large projects, one query per (severity, type) pair.
//!
//! Severities partition the issue space, so pass 1 alone is complete once
//! no severity saturates. Passes 2 to 4 only add what pass 1 missed.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use super::executor::QueryExecutor;
use super::seen::SeenSet;
use super::segment::segment_by_date;
use super::HarvestError;
use crate::core::filter::Filter;
use crate::core::types::{Issue, IssueStatus, IssueType, ProjectKey, Severity};

/// Deduplicated issues for one project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectReport {
    pub project: ProjectKey,
    pub issues: Vec<Issue>,
}

impl ProjectReport {
    pub fn count(&self) -> usize {
        self.issues.len()
    }
}

/// Drives the executor over the coverage passes for one project at a time.
pub struct CoveragePlanner<'a> {
    executor: QueryExecutor<'a>,
    today: NaiveDate,
}

impl<'a> CoveragePlanner<'a> {
    /// Create a planner that segments up to today's UTC date.
    pub fn new(executor: QueryExecutor<'a>) -> Self {
        Self::with_today(executor, Utc::now().date_naive())
    }

    /// Create a planner with a fixed notion of "today".
    pub fn with_today(executor: QueryExecutor<'a>, today: NaiveDate) -> Self {
        Self { executor, today }
    }

    /// Collect every issue of `project`, without duplicate keys.
    ///
    /// # Errors
    ///
    /// - `MissingCreationDate` if a severity saturates and none of its
    ///   issues carries a usable creation date
    /// - `RateLimitExhausted` if a configured retry budget runs out
    pub async fn harvest_project(&self, project: &ProjectKey) -> Result<ProjectReport, HarvestError> {
        let settings = self.executor.settings();
        let mut seen = SeenSet::new();
        let mut issues = Vec::new();

        info!(%project, "harvesting project");

        for severity in Severity::ALL {
            let filter = Filter::severity(severity.clone());
            let outcome = self.executor.run(project, &filter).await?;

            if !outcome.saturated(settings.ceiling) {
                seen.merge(outcome.issues, &mut issues);
                continue;
            }

            let earliest = outcome
                .issues
                .iter()
                .filter_map(Issue::created_on)
                .min()
                .ok_or_else(|| HarvestError::MissingCreationDate {
                    project: project.to_string(),
                    filter: filter.to_string(),
                    ceiling: settings.ceiling,
                })?;

            info!(
                %project,
                %severity,
                remote_total = ?outcome.remote_total,
                %earliest,
                "severity hit the result ceiling, segmenting by date"
            );

            seen.merge(outcome.issues, &mut issues);
            let fresh =
                segment_by_date(&self.executor, project, &filter, &mut seen, earliest, self.today)
                    .await?;
            issues.extend(fresh);
        }

        for issue_type in IssueType::ALL {
            let filter = Filter::issue_type(issue_type.clone());
            self.best_effort_pass(project, &filter, &mut seen, &mut issues)
                .await?;
        }

        for status in IssueStatus::ALL {
            let filter = Filter::status(status.clone());
            self.best_effort_pass(project, &filter, &mut seen, &mut issues)
                .await?;
        }

        if issues.len() >= settings.cross_product_threshold {
            info!(
                %project,
                collected = issues.len(),
                "large project, running severity x type queries"
            );
            for severity in Severity::ALL {
                for issue_type in IssueType::ALL {
                    let filter = Filter::severity(severity.clone()).and_type(issue_type.clone());
                    self.best_effort_pass(project, &filter, &mut seen, &mut issues)
                        .await?;
                }
            }
        }

        info!(%project, issues = issues.len(), "project done");

        Ok(ProjectReport {
            project: project.clone(),
            issues,
        })
    }

    /// Run one query and merge it; saturation is only logged.
    async fn best_effort_pass(
        &self,
        project: &ProjectKey,
        filter: &Filter,
        seen: &mut SeenSet,
        issues: &mut Vec<Issue>,
    ) -> Result<(), HarvestError> {
        let ceiling = self.executor.settings().ceiling;
        let outcome = self.executor.run(project, filter).await?;
        if outcome.saturated(ceiling) {
            warn!(
                %project,
                %filter,
                remote_total = ?outcome.remote_total,
                ceiling,
                "partition hit the result ceiling and is not segmented"
            );
        }
        seen.merge(outcome.issues, issues);
        Ok(())
    }
}
