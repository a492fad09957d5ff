//! sonar-harvest - Complete issue exports from SonarCloud / SonarQube
//!
//! The issue search API pages at 500 results and refuses to go past 10,000
//! results for any single query. sonar-harvest retrieves the complete issue
//! set of large projects anyway, by splitting each project into queries that
//! stay under the ceiling and merging their results without duplicates.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to harvest)
//! - [`harvest`] - The harvesting engine: executor, planner, segmentation, report
//! - [`source`] - Abstraction for the remote issue search service
//! - [`core`] - Domain types, filters, and configuration
//! - [`ui`] - User-facing output
//!
//! # Guarantees
//!
//! 1. A project's issue list never holds the same key twice
//! 2. No single query returns more than the result ceiling
//! 3. Rate limiting is retried transparently
//! 4. A failed harvest still returns the issues of completed projects

pub mod cli;
pub mod core;
pub mod harvest;
pub mod source;
pub mod ui;
