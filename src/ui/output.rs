//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag. Reports
//! go to files; the terminal only gets summaries. Diagnostics from the
//! engine go through `tracing` to stderr instead.

use std::fmt::Display;

use crate::harvest::ExportStats;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Format export statistics as an aligned block.
pub fn format_stats(stats: &ExportStats) -> String {
    let mut lines = vec![
        format!("Total issues: {}", stats.total_issues),
        format!("Projects:     {}", stats.project_count),
    ];
    if !stats.severity_breakdown.is_empty() {
        lines.push("By severity:".to_string());
        lines.extend(
            stats
                .severity_breakdown
                .iter()
                .map(|c| format!("  {:<10} {:>8}", c.severity, c.count)),
        );
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Issue, Severity};

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn stats_block() {
        let mut issue = Issue::new("a");
        issue.severity = Some(Severity::Major);
        let stats = ExportStats::compute(&[issue, Issue::new("b")], 1);

        let block = format_stats(&stats);
        assert!(block.contains("Total issues: 2"));
        assert!(block.contains("MAJOR"));
        assert!(block.contains("UNKNOWN"));
        assert!(!block.contains("BLOCKER"));
    }
}
