//! source::mock
//!
//! Mock issue source for deterministic testing.
//!
//! # Design
//!
//! The mock holds an in-memory issue dataset and answers searches the way
//! the real server does: filters apply, results are sorted by creation date,
//! pages past the result ceiling are rejected with a 400, and the reported
//! `total` counts every match. Failures can be scripted per project and
//! page, and every call is recorded for verification.
//!
//! # Example
//!
//! ```
//! use sonar_harvest::source::mock::{fixture_issue, MockSource};
//! use sonar_harvest::source::{IssueQuery, IssueSource};
//! use sonar_harvest::core::{filter::Filter, types::ProjectKey};
//!
//! # tokio_test::block_on(async {
//! let source = MockSource::with_issues(vec![
//!     fixture_issue("proj-a", "a1"),
//!     fixture_issue("proj-a", "a2"),
//!     fixture_issue("proj-b", "b1"),
//! ]);
//!
//! let query = IssueQuery::new(ProjectKey::new("proj-a").unwrap(), Filter::default(), 500);
//! let page = source.search_issues(&query).await.unwrap();
//! assert_eq!(page.total, 2);
//! # });
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::traits::{IssuePage, IssueQuery, IssueSource, Project, SourceError};
use crate::core::config::SERVER_RESULT_CEILING;
use crate::core::filter::Filter;
use crate::core::types::{Issue, IssueStatus, IssueType, Severity};

/// Mock issue source for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockSource {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockSourceInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockSourceInner {
    /// Dataset, kept sorted by (creation date, key).
    issues: Vec<Issue>,
    /// Projects returned by `list_projects`.
    projects: Vec<Project>,
    /// Answer to `validate_token`.
    token_valid: bool,
    /// Server-side result ceiling.
    ceiling: usize,
    /// Scripted failures, consulted in order.
    failures: Vec<ScriptedFailure>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail searches matching `project` / `page` (`None` matches any).
    ///
    /// `times` limits how often the failure fires; `None` fails forever.
    Search {
        project: Option<String>,
        page: Option<u32>,
        error: SourceError,
        times: Option<usize>,
    },
    /// Fail every search restricted to a creation-date window.
    DateWindow(SourceError),
    /// Fail list_projects with the given error.
    ListProjects(SourceError),
    /// Fail validate_token with the given error.
    ValidateToken(SourceError),
}

#[derive(Debug)]
struct ScriptedFailure {
    rule: FailOn,
    remaining: Option<usize>,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    Search {
        project: String,
        filter: Filter,
        page: u32,
        page_size: u32,
    },
    ListProjects {
        organization: String,
    },
    ValidateToken,
}

/// Build a test issue for `project` with sensible defaults.
///
/// Defaults: severity MAJOR, type CODE_SMELL, status OPEN, created
/// 2024-01-01, component `{project}:src/lib.rs`.
pub fn fixture_issue(project: &str, key: &str) -> Issue {
    let mut issue = Issue::new(key);
    issue.severity = Some(Severity::Major);
    issue.issue_type = Some(IssueType::CodeSmell);
    issue.status = Some(IssueStatus::Open);
    issue.component = Some(format!("{}:src/lib.rs", project));
    issue.project = Some(project.to_string());
    issue.creation_date = Some("2024-01-01T09:00:00+0000".to_string());
    issue
}

impl MockSource {
    /// Create an empty mock source.
    pub fn new() -> Self {
        Self::with_issues(Vec::new())
    }

    /// Create a mock source holding the given issues.
    pub fn with_issues(mut issues: Vec<Issue>) -> Self {
        issues.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.key.cmp(&b.key))
        });

        Self {
            inner: Arc::new(Mutex::new(MockSourceInner {
                issues,
                projects: Vec::new(),
                token_valid: true,
                ceiling: SERVER_RESULT_CEILING,
                failures: Vec::new(),
                operations: Vec::new(),
            })),
        }
    }

    /// Set the projects returned by `list_projects`.
    pub fn with_projects(self, projects: Vec<Project>) -> Self {
        self.inner.lock().unwrap().projects = projects;
        self
    }

    /// Set the server-side result ceiling (default 10,000).
    pub fn with_ceiling(self, ceiling: usize) -> Self {
        self.inner.lock().unwrap().ceiling = ceiling;
        self
    }

    /// Make `validate_token` answer `valid: false`.
    pub fn reject_token(self) -> Self {
        self.inner.lock().unwrap().token_valid = false;
        self
    }

    /// Add a failure rule.
    ///
    /// # Example
    ///
    /// ```
    /// use sonar_harvest::source::mock::{FailOn, MockSource};
    /// use sonar_harvest::source::SourceError;
    ///
    /// let source = MockSource::new().fail_on(FailOn::Search {
    ///     project: Some("proj-a".into()),
    ///     page: Some(2),
    ///     error: SourceError::RateLimited,
    ///     times: Some(1),
    /// });
    /// ```
    pub fn fail_on(self, rule: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let remaining = match &rule {
                FailOn::Search { times, .. } => *times,
                _ => None,
            };
            inner.failures.push(ScriptedFailure { rule, remaining });
        }
        self
    }

    /// Clear all failure rules.
    pub fn clear_fail_on(&self) {
        self.inner.lock().unwrap().failures.clear();
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Recorded searches as `(project, filter, page)`.
    pub fn searches(&self) -> Vec<(String, Filter, u32)> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::Search {
                    project,
                    filter,
                    page,
                    ..
                } => Some((project, filter, page)),
                _ => None,
            })
            .collect()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.inner.lock().unwrap().operations.clear();
    }

    fn record(&self, op: MockOperation) {
        self.inner.lock().unwrap().operations.push(op);
    }

    /// Check if a search should fail, consuming one use of the rule.
    fn check_search_fail(&self, query: &IssueQuery) -> Option<SourceError> {
        let mut inner = self.inner.lock().unwrap();
        for failure in inner.failures.iter_mut() {
            if failure.remaining == Some(0) {
                continue;
            }
            let hit = match &failure.rule {
                FailOn::Search {
                    project,
                    page,
                    error,
                    ..
                } => {
                    let project_matches = project
                        .as_deref()
                        .map_or(true, |p| p == query.project.as_str());
                    let page_matches = page.map_or(true, |p| p == query.page);
                    (project_matches && page_matches).then(|| error.clone())
                }
                FailOn::DateWindow(error) => (query.filter.created_after.is_some()
                    || query.filter.created_before.is_some())
                .then(|| error.clone()),
                _ => None,
            };
            if let Some(error) = hit {
                if let Some(remaining) = failure.remaining.as_mut() {
                    *remaining -= 1;
                }
                return Some(error);
            }
        }
        None
    }

    fn check_fail(&self, pick: impl Fn(&FailOn) -> Option<&SourceError>) -> Option<SourceError> {
        let inner = self.inner.lock().unwrap();
        inner
            .failures
            .iter()
            .find_map(|f| pick(&f.rule).cloned())
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IssueSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn search_issues(&self, query: &IssueQuery) -> Result<IssuePage, SourceError> {
        self.record(MockOperation::Search {
            project: query.project.to_string(),
            filter: query.filter.clone(),
            page: query.page,
            page_size: query.page_size,
        });

        if let Some(err) = self.check_search_fail(query) {
            return Err(err);
        }

        let inner = self.inner.lock().unwrap();
        let page_size = query.page_size as usize;
        let reach = query.page as usize * page_size;
        if reach > inner.ceiling {
            return Err(SourceError::ApiError {
                status: 400,
                message: format!(
                    "Can return only the first {} results. {}th result asked.",
                    inner.ceiling, reach
                ),
            });
        }

        let matching: Vec<&Issue> = inner
            .issues
            .iter()
            .filter(|i| i.project.as_deref() == Some(query.project.as_str()))
            .filter(|i| satisfies(&query.filter, i))
            .collect();

        let start = (query.page.saturating_sub(1) as usize) * page_size;
        let issues = matching
            .iter()
            .skip(start)
            .take(page_size)
            .map(|i| (*i).clone())
            .collect();

        Ok(IssuePage {
            issues,
            total: matching.len(),
        })
    }

    async fn list_projects(&self, organization: &str) -> Result<Vec<Project>, SourceError> {
        self.record(MockOperation::ListProjects {
            organization: organization.to_string(),
        });

        if let Some(err) = self.check_fail(|rule| match rule {
            FailOn::ListProjects(e) => Some(e),
            _ => None,
        }) {
            return Err(err);
        }

        Ok(self.inner.lock().unwrap().projects.clone())
    }

    async fn validate_token(&self) -> Result<bool, SourceError> {
        self.record(MockOperation::ValidateToken);

        if let Some(err) = self.check_fail(|rule| match rule {
            FailOn::ValidateToken(e) => Some(e),
            _ => None,
        }) {
            return Err(err);
        }

        Ok(self.inner.lock().unwrap().token_valid)
    }
}

/// Whether `issue` satisfies every constraint of `filter`, the way the
/// server applies it.
///
/// Issues without a parseable creation date never match a date bound.
fn satisfies(filter: &Filter, issue: &Issue) -> bool {
    if filter.severity.is_some() && issue.severity != filter.severity {
        return false;
    }
    if filter.issue_type.is_some() && issue.issue_type != filter.issue_type {
        return false;
    }
    if filter.status.is_some() && issue.status != filter.status {
        return false;
    }
    if filter.created_after.is_none() && filter.created_before.is_none() {
        return true;
    }

    let Some(created) = issue.created_on() else {
        return false;
    };
    if filter.created_after.is_some_and(|after| created < after) {
        return false;
    }
    !filter.created_before.is_some_and(|before| created >= before)
}
