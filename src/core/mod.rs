//! core
//!
//! Core domain types and configuration for sonar-harvest.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ProjectKey, Issue, Severity, etc.
//! - [`filter`] - Typed search constraints
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Fields the harvester does not inspect pass through untouched

pub mod config;
pub mod filter;
pub mod types;
