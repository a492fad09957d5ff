//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All terminal output from commands goes through this module so that
//! `--quiet` is honored consistently.

pub mod output;
