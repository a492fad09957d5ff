//! source
//!
//! Abstraction for the remote issue search service.
//!
//! # Architecture
//!
//! The `IssueSource` trait defines the interface to the analysis server.
//! The harvester only ever talks to `&dyn IssueSource`, so the engine can be
//! exercised against the in-memory [`mock`] as well as the real server.
//!
//! # Modules
//!
//! - `traits`: Core `IssueSource` trait and request/response types
//! - [`sonarcloud`]: SonarCloud / SonarQube Web API implementation
//! - [`mock`]: In-memory implementation for deterministic testing

pub mod mock;
pub mod sonarcloud;
mod traits;

pub use traits::*;
