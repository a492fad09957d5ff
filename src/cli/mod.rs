//! cli
//!
//! Command-line interface layer for sonar-harvest.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Set up logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, resolves
//! configuration and the token, and hands a validated request to
//! [`crate::harvest`]. Async work runs on a runtime created per command.
//!
//! # Exit Status
//!
//! [`exit_code`] maps errors to process exit codes: 2 for invalid input,
//! 1 for everything else.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use std::path::PathBuf;

use anyhow::Result;
use tracing::Level;

use crate::harvest::RequestError;

/// Exit status for invalid input.
pub const EXIT_USAGE: i32 = 2;

/// Exit status for every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Per-invocation settings derived from global flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Prompts allowed.
    pub interactive: bool,
}

impl Context {
    /// The directory commands operate in.
    pub fn cwd(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        interactive: cli.interactive(),
    };

    init_tracing(&ctx)?;

    commands::dispatch(cli.command, &ctx)
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` is honored; `--debug` and `--quiet` set the floor.
pub fn init_tracing(ctx: &Context) -> Result<()> {
    let level = if ctx.debug {
        Level::DEBUG
    } else if ctx.quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}

/// Process exit status for an error returned by [`run`].
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<RequestError>().is_some() {
        EXIT_USAGE
    } else {
        EXIT_FAILURE
    }
}
