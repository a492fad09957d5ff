//! harvest::segment
//!
//! Date-range segmentation for a saturated partition.
//!
//! A partition that hits the result ceiling is re-queried in consecutive
//! creation-date windows, starting at the earliest creation date the capped
//! result contains and walking forward to today. Windows are half-open
//! (`createdAfter` inclusive, `createdBefore` exclusive), so they tile the
//! range without overlap.
//!
//! A window that itself reaches the ceiling is split in half and each half
//! is queried in turn, down to single-day windows. A single day that still
//! saturates is kept as-is and logged.

use std::collections::VecDeque;

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use super::executor::QueryExecutor;
use super::seen::SeenSet;
use super::HarvestError;
use crate::core::filter::Filter;
use crate::core::types::{Issue, ProjectKey};

/// A creation-date window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of calendar days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Split into two halves, or `None` for a single-day window.
    pub fn bisect(&self) -> Option<(DateWindow, DateWindow)> {
        let days = self.days();
        if days <= 1 {
            return None;
        }
        let mid = self.start + Duration::days(days / 2);
        Some((DateWindow::new(self.start, mid), DateWindow::new(mid, self.end)))
    }

    /// Apply this window to a base filter.
    pub fn apply(&self, base: &Filter) -> Filter {
        base.clone().within(self.start, self.end)
    }
}

/// Consecutive `window_days`-wide windows from `start` until one starts after `today`.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use sonar_harvest::harvest::segment::windows;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let today = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
///
/// let ws = windows(start, today, 30);
/// assert_eq!(ws.len(), 2);
/// assert_eq!(ws[0].end, ws[1].start);
/// ```
pub fn windows(start: NaiveDate, today: NaiveDate, window_days: u32) -> Vec<DateWindow> {
    let step = Duration::days(i64::from(window_days.max(1)));
    let mut out = Vec::new();
    let mut cursor = start;
    while cursor <= today {
        let end = cursor + step;
        out.push(DateWindow::new(cursor, end));
        cursor = end;
    }
    out
}

/// Re-query `base` window by window from `start` to `today`.
///
/// Issues whose key is already in `seen` are skipped. Returns only the
/// issues that were new, and records them in `seen`.
///
/// # Errors
///
/// Propagates `HarvestError` from the executor (rate-limit budget).
pub async fn segment_by_date(
    executor: &QueryExecutor<'_>,
    project: &ProjectKey,
    base: &Filter,
    seen: &mut SeenSet,
    start: NaiveDate,
    today: NaiveDate,
) -> Result<Vec<Issue>, HarvestError> {
    let ceiling = executor.settings().ceiling;
    let mut pending: VecDeque<DateWindow> =
        windows(start, today, executor.settings().window_days).into();
    let mut fresh = Vec::new();

    debug!(%project, %base, %start, %today, windows = pending.len(), "segmenting by date");

    while let Some(window) = pending.pop_front() {
        let outcome = executor.run(project, &window.apply(base)).await?;
        let saturated = outcome.saturated(ceiling);
        let added = seen.merge(outcome.issues, &mut fresh);

        debug!(
            %project,
            start = %window.start,
            end = %window.end,
            added,
            saturated,
            "window done"
        );

        if !saturated {
            continue;
        }

        match window.bisect() {
            Some((left, right)) => {
                pending.push_front(right);
                pending.push_front(left);
            }
            None => warn!(
                %project,
                %base,
                day = %window.start,
                ceiling,
                "single-day window still hits the result ceiling, issues may be missing"
            ),
        }
    }

    Ok(fresh)
}
