//! harvest::report
//!
//! Aggregate report over all requested projects.
//!
//! # Payloads
//!
//! ```text
//! success: { issues, summary: { totalIssues, projectsProcessed, projects: [{ key, issuesCount }] } }
//! failure: { error, partialResults: { issues, count } | null }
//! ```
//!
//! Per-project counts in the summary are computed from the combined list by
//! `component` prefix, not taken from the per-project results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::executor::QueryExecutor;
use super::planner::CoveragePlanner;
use super::{HarvestError, HarvestSettings};
use crate::core::types::{Issue, ProjectKey, Severity};
use crate::source::IssueSource;

/// Label for issues without a severity in [`ExportStats`].
pub const UNKNOWN_SEVERITY: &str = "UNKNOWN";

/// Issue count for one requested project key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCount {
    pub key: String,
    pub issues_count: usize,
}

/// Summary block of a successful harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestSummary {
    pub total_issues: usize,
    pub projects_processed: usize,
    pub projects: Vec<ProjectCount>,
}

impl HarvestSummary {
    /// Summarize `issues` against the requested `projects`.
    ///
    /// A project's count is the number of issues whose `component` starts
    /// with its key, so a key that is a prefix of another also counts the
    /// other's issues.
    ///
    /// # Example
    ///
    /// ```
    /// use sonar_harvest::core::types::{Issue, ProjectKey};
    /// use sonar_harvest::harvest::HarvestSummary;
    ///
    /// let mut a = Issue::new("a");
    /// a.component = Some("proj-a:src/x".into());
    /// let mut b = Issue::new("b");
    /// b.component = Some("proj-b:src/y".into());
    ///
    /// let keys = [ProjectKey::new("proj-a").unwrap(), ProjectKey::new("proj-b").unwrap()];
    /// let summary = HarvestSummary::compute(&[a, b], &keys);
    /// assert_eq!(summary.total_issues, 2);
    /// assert_eq!(summary.projects[0].issues_count, 1);
    /// ```
    pub fn compute(issues: &[Issue], projects: &[ProjectKey]) -> Self {
        Self {
            total_issues: issues.len(),
            projects_processed: projects.len(),
            projects: projects
                .iter()
                .map(|key| ProjectCount {
                    key: key.to_string(),
                    issues_count: issues.iter().filter(|i| i.belongs_to(key.as_str())).count(),
                })
                .collect(),
        }
    }
}

/// Success payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestReport {
    pub issues: Vec<Issue>,
    pub summary: HarvestSummary,
}

impl HarvestReport {
    pub fn new(issues: Vec<Issue>, projects: &[ProjectKey]) -> Self {
        let summary = HarvestSummary::compute(&issues, projects);
        Self { issues, summary }
    }
}

/// Issues collected before a harvest failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialResults {
    pub issues: Vec<Issue>,
    pub count: usize,
}

/// Failure payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestFailure {
    pub error: String,
    pub partial_results: Option<PartialResults>,
}

impl HarvestFailure {
    /// Build a failure, dropping `partialResults` when nothing was collected.
    pub fn new(error: impl Into<String>, issues: Vec<Issue>) -> Self {
        let partial_results = if issues.is_empty() {
            None
        } else {
            Some(PartialResults {
                count: issues.len(),
                issues,
            })
        };
        Self {
            error: error.into(),
            partial_results,
        }
    }
}

/// Result of a harvest: either payload, serialized without a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HarvestOutcome {
    Success(HarvestReport),
    Failure(HarvestFailure),
}

impl HarvestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, HarvestOutcome::Success(_))
    }

    /// Issues carried by the payload (partial ones on failure).
    pub fn issues(&self) -> &[Issue] {
        match self {
            HarvestOutcome::Success(report) => &report.issues,
            HarvestOutcome::Failure(failure) => failure
                .partial_results
                .as_ref()
                .map(|p| p.issues.as_slice())
                .unwrap_or_default(),
        }
    }
}

/// Severity count for [`ExportStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeverityCount {
    pub severity: String,
    pub count: usize,
}

/// Figures shown after an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStats {
    pub total_issues: usize,
    pub project_count: usize,
    /// Known severities first, in canonical order, then `UNKNOWN` and any
    /// other value the server reported. Zero counts are omitted.
    pub severity_breakdown: Vec<SeverityCount>,
}

impl ExportStats {
    pub fn compute(issues: &[Issue], project_count: usize) -> Self {
        let mut breakdown: Vec<SeverityCount> = Severity::ALL
            .iter()
            .map(|s| SeverityCount {
                severity: s.to_string(),
                count: 0,
            })
            .collect();

        for issue in issues {
            let label = issue
                .severity
                .as_ref()
                .map_or(UNKNOWN_SEVERITY, Severity::as_str);
            match breakdown.iter_mut().find(|c| c.severity == label) {
                Some(entry) => entry.count += 1,
                None => breakdown.push(SeverityCount {
                    severity: label.to_string(),
                    count: 1,
                }),
            }
        }

        breakdown.retain(|c| c.count > 0);

        Self {
            total_issues: issues.len(),
            project_count,
            severity_breakdown: breakdown,
        }
    }

    /// Count for one severity label.
    pub fn count_of(&self, severity: &str) -> usize {
        self.severity_breakdown
            .iter()
            .find(|c| c.severity == severity)
            .map_or(0, |c| c.count)
    }
}

/// Runs the planner over every requested project and builds the payload.
pub struct Harvester<'a> {
    source: &'a dyn IssueSource,
    settings: &'a HarvestSettings,
    today: Option<NaiveDate>,
}

impl<'a> Harvester<'a> {
    pub fn new(source: &'a dyn IssueSource, settings: &'a HarvestSettings) -> Self {
        Self {
            source,
            settings,
            today: None,
        }
    }

    /// Fix the date segmentation walks up to (defaults to today, UTC).
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Harvest `projects` in order.
    ///
    /// Never fails: errors become a [`HarvestFailure`] carrying the issues
    /// of every project completed before the error.
    pub async fn harvest(&self, projects: &[ProjectKey]) -> HarvestOutcome {
        let mut issues = Vec::new();
        match self.collect(projects, &mut issues).await {
            Ok(()) => {
                info!(
                    projects = projects.len(),
                    issues = issues.len(),
                    "harvest complete"
                );
                HarvestOutcome::Success(HarvestReport::new(issues, projects))
            }
            Err(err) => {
                error!(error = %err, collected = issues.len(), "harvest failed");
                HarvestOutcome::Failure(HarvestFailure::new(err.to_string(), issues))
            }
        }
    }

    async fn collect(
        &self,
        projects: &[ProjectKey],
        issues: &mut Vec<Issue>,
    ) -> Result<(), HarvestError> {
        if !self.source.validate_token().await? {
            return Err(HarvestError::TokenRejected(self.source.name().to_string()));
        }

        let executor = QueryExecutor::new(self.source, self.settings);
        let planner = match self.today {
            Some(today) => CoveragePlanner::with_today(executor, today),
            None => CoveragePlanner::new(executor),
        };

        for (index, project) in projects.iter().enumerate() {
            info!(
                %project,
                position = index + 1,
                of = projects.len(),
                "starting project"
            );
            let report = planner.harvest_project(project).await?;
            issues.extend(report.issues);
        }
        Ok(())
    }
}
