//! Property-based tests for the harvesting invariants.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated datasets.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use sonar_harvest::core::filter::Filter;
use sonar_harvest::core::types::{Issue, IssueStatus, IssueType, ProjectKey, Severity};
use sonar_harvest::harvest::{CoveragePlanner, HarvestSettings, QueryExecutor, SeenSet};
use sonar_harvest::source::mock::{fixture_issue, MockSource};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
}

/// Strategy for one issue's (severity, type, status, day offset).
fn issue_shape() -> impl Strategy<Value = (usize, usize, usize, i64)> {
    (0..Severity::ALL.len(), 0..IssueType::ALL.len(), 0..IssueStatus::ALL.len(), 0i64..366)
}

fn build_dataset(project: &str, shapes: &[(usize, usize, usize, i64)]) -> Vec<Issue> {
    shapes
        .iter()
        .enumerate()
        .map(|(i, &(sev, typ, status, day))| {
            let mut issue = fixture_issue(project, &format!("{}-{:04}", project, i));
            issue.severity = Some(Severity::ALL[sev].clone());
            issue.issue_type = Some(IssueType::ALL[typ].clone());
            issue.status = Some(IssueStatus::ALL[status].clone());
            let created = base_date() + Duration::days(day);
            issue.creation_date = Some(format!("{}T08:30:00+0000", created.format("%Y-%m-%d")));
            issue
        })
        .collect()
}

proptest! {
    #[test]
    fn merge_keeps_first_occurrence_of_each_key(keys in prop::collection::vec("[a-e]{1,2}", 0..60)) {
        let mut seen = SeenSet::new();
        let mut out = Vec::new();
        seen.merge(keys.iter().map(Issue::new), &mut out);

        let mut expected = Vec::new();
        let mut known = HashSet::new();
        for key in &keys {
            if known.insert(key.clone()) {
                expected.push(key.clone());
            }
        }

        let got: Vec<String> = out.into_iter().map(|i| i.key).collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(seen.len(), known.len());
    }

    #[test]
    fn executor_stops_at_last_reachable_page(
        n in 0usize..400,
        page_size in 1u32..40,
        ceiling in 1usize..200,
    ) {
        let ceiling = ceiling.max(page_size as usize);
        let issues: Vec<Issue> = (0..n)
            .map(|i| fixture_issue("p", &format!("k{:04}", i)))
            .collect();
        let source = MockSource::with_issues(issues).with_ceiling(ceiling);
        let settings = HarvestSettings {
            page_size,
            ceiling,
            ..HarvestSettings::default().without_delays()
        };

        let outcome = tokio_test::block_on(
            QueryExecutor::new(&source, &settings).run(&ProjectKey::new("p").unwrap(), &Filter::default()),
        )
        .unwrap();

        // The last page that fits under the ceiling bounds what is reachable
        let reachable = ceiling - ceiling % page_size as usize;
        prop_assert!(outcome.issues.len() <= ceiling);
        prop_assert_eq!(outcome.issues.len(), n.min(reachable));
        if n > reachable {
            prop_assert!(outcome.saturated(ceiling));
        }
    }

    #[test]
    fn harvest_is_duplicate_free_and_complete(
        shapes in prop::collection::vec(issue_shape(), 0..250),
    ) {
        let issues = build_dataset("p", &shapes);
        let source = MockSource::with_issues(issues).with_ceiling(40);
        let settings = HarvestSettings {
            page_size: 10,
            ceiling: 40,
            ..HarvestSettings::default().without_delays()
        };
        let planner = CoveragePlanner::with_today(QueryExecutor::new(&source, &settings), today());

        let report = tokio_test::block_on(planner.harvest_project(&ProjectKey::new("p").unwrap())).unwrap();

        let unique: HashSet<&str> = report.issues.iter().map(|i| i.key.as_str()).collect();
        prop_assert_eq!(unique.len(), report.issues.len());

        // Complete whenever no single (severity, day) bucket reaches the ceiling
        let mut buckets: HashMap<(usize, i64), usize> = HashMap::new();
        for &(sev, _, _, day) in &shapes {
            *buckets.entry((sev, day)).or_default() += 1;
        }
        if buckets.values().all(|&count| count < 40) {
            prop_assert_eq!(report.issues.len(), shapes.len());
        }
    }
}
