//! core::filter
//!
//! Query constraints passed to an issue search.
//!
//! A [`Filter`] is rendered verbatim into search parameters:
//!
//! | Field            | Parameter       |
//! |------------------|-----------------|
//! | `severity`       | `severities`    |
//! | `issue_type`     | `types`         |
//! | `status`         | `statuses`      |
//! | `created_after`  | `createdAfter`  |
//! | `created_before` | `createdBefore` |
//!
//! Date bounds are ISO calendar dates. `createdAfter` is inclusive and
//! `createdBefore` is exclusive, so consecutive windows `[a, b)` and `[b, c)`
//! never overlap.

use std::fmt;

use chrono::NaiveDate;

use super::types::{IssueStatus, IssueType, Severity};

/// Calendar date format used by the search API.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A typed set of search constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub severity: Option<Severity>,
    pub issue_type: Option<IssueType>,
    pub status: Option<IssueStatus>,
    pub created_after: Option<NaiveDate>,
    pub created_before: Option<NaiveDate>,
}

impl Filter {
    /// Filter on a single severity.
    pub fn severity(severity: Severity) -> Self {
        Self {
            severity: Some(severity),
            ..Default::default()
        }
    }

    /// Filter on a single issue type.
    pub fn issue_type(issue_type: IssueType) -> Self {
        Self {
            issue_type: Some(issue_type),
            ..Default::default()
        }
    }

    /// Filter on a single status.
    pub fn status(status: IssueStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Combine with an issue type constraint.
    pub fn and_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = Some(issue_type);
        self
    }

    /// Restrict to issues created in `[after, before)`.
    pub fn within(mut self, after: NaiveDate, before: NaiveDate) -> Self {
        self.created_after = Some(after);
        self.created_before = Some(before);
        self
    }

    /// Search parameters for this filter, in a stable order.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(severity) = &self.severity {
            params.push(("severities", severity.to_string()));
        }
        if let Some(issue_type) = &self.issue_type {
            params.push(("types", issue_type.to_string()));
        }
        if let Some(status) = &self.status {
            params.push(("statuses", status.to_string()));
        }
        if let Some(after) = self.created_after {
            params.push(("createdAfter", after.format(DATE_FORMAT).to_string()));
        }
        if let Some(before) = self.created_before {
            params.push(("createdBefore", before.format(DATE_FORMAT).to_string()));
        }
        params
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.query_params();
        if params.is_empty() {
            return f.write_str("(unfiltered)");
        }
        let rendered: Vec<String> = params
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        f.write_str(&rendered.join(" "))
    }
}
