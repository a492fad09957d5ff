//! harvest command - Harvest issues into a JSON report
//!
//! # Example
//!
//! ```bash
//! # Token from the environment
//! SONAR_TOKEN=squ_xxx sonar-harvest harvest my-org_backend my-org_frontend
//!
//! # Explicit report path
//! sonar-harvest harvest my-org_backend --output backend.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use chrono::Utc;

use super::{load_config, resolve_token};
use crate::cli::Context;
use crate::harvest::{run_harvest, ExportStats, HarvestOutcome, HarvestRequest};
use crate::ui::output::{self, Verbosity};

/// Run the harvest command.
///
/// This is a synchronous wrapper that uses tokio to run the harvest.
pub fn harvest(
    ctx: &Context,
    projects: &[String],
    output_path: Option<&Path>,
    token: Option<&str>,
    base_url: Option<&str>,
) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let config = load_config(ctx)?;

    let token = resolve_token(ctx, token)?;
    let request = HarvestRequest::new(&token, projects)?;

    let report_path = match output_path {
        Some(path) => path.to_path_buf(),
        None => ctx.cwd()?.join(default_report_name()),
    };

    output::print(
        format!(
            "Harvesting {} project(s) from {}",
            request.projects().len(),
            base_url.unwrap_or_else(|| config.base_url())
        ),
        verbosity,
    );

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let outcome = rt.block_on(run_harvest(&request, &config, base_url));

    write_report(&report_path, &outcome)?;

    let stats = ExportStats::compute(outcome.issues(), request.projects().len());

    match outcome {
        HarvestOutcome::Success(report) => {
            for project in &report.summary.projects {
                output::print(
                    format!("  {:<40} {:>8}", project.key, project.issues_count),
                    verbosity,
                );
            }
            output::print(output::format_stats(&stats), verbosity);
            output::success(
                format!(
                    "Wrote {} issues to {}",
                    report.summary.total_issues,
                    report_path.display()
                ),
                verbosity,
            );
            Ok(())
        }
        HarvestOutcome::Failure(failure) => {
            let kept = failure.partial_results.as_ref().map_or(0, |p| p.count);
            if kept > 0 {
                output::print(output::format_stats(&stats), verbosity);
            }
            output::warn(
                format!(
                    "Kept {} issues from completed projects in {}",
                    kept,
                    report_path.display()
                ),
                verbosity,
            );
            bail!("Harvest failed: {}", failure.error)
        }
    }
}

/// `sonar-report-YYYY-MM-DD.json` for today's UTC date.
fn default_report_name() -> PathBuf {
    PathBuf::from(format!(
        "sonar-report-{}.json",
        Utc::now().date_naive().format("%Y-%m-%d")
    ))
}

fn write_report(path: &Path, outcome: &HarvestOutcome) -> Result<()> {
    let json = serde_json::to_string_pretty(outcome).context("Failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::HarvestFailure;
    use tempfile::TempDir;

    #[test]
    fn default_name_has_date() {
        let name = default_report_name();
        let name = name.to_string_lossy();
        assert!(name.starts_with("sonar-report-"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "sonar-report-2024-01-01.json".len());
    }

    #[test]
    fn writes_failure_payload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let outcome = HarvestOutcome::Failure(HarvestFailure::new("boom", Vec::new()));

        write_report(&path, &outcome).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["error"], "boom");
        assert!(written["partialResults"].is_null());
    }
}
