//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration for the working directory
//! 2. Validates command-specific arguments
//! 3. Runs the work and formats the output
//!
//! # Async Commands
//!
//! Commands that talk to the server (harvest, projects) are async. Their
//! synchronous wrappers create a `tokio::runtime::Runtime` and block on the
//! async implementation.

mod completion;
mod config_cmd;
mod harvest;
mod projects;

pub use completion::completion;
pub use config_cmd::config;
pub use harvest::harvest;
pub use projects::projects;

use std::io::{self, Write};

use anyhow::{Context as _, Result};

use super::Context;
use crate::cli::args::Command;
use crate::core::config::{Config, ConfigLoadResult};
use crate::ui::output::{self, Verbosity};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Harvest {
            projects,
            output,
            token,
            base_url,
        } => harvest::harvest(
            ctx,
            &projects,
            output.as_deref(),
            token.as_deref(),
            base_url.as_deref(),
        ),
        Command::Projects {
            organization,
            token,
            base_url,
        } => projects::projects(
            ctx,
            organization.as_deref(),
            token.as_deref(),
            base_url.as_deref(),
        ),
        Command::Config => config_cmd::config(ctx),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load configuration for the working directory, printing any warnings.
pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    let cwd = ctx.cwd()?;
    let ConfigLoadResult { config, warnings } =
        Config::load(Some(&cwd)).context("Failed to load config")?;

    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    for warning in warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            verbosity,
        );
    }

    Ok(config)
}

/// Token from argument or interactive prompt.
///
/// Returns an empty string when no token is available and prompting is not
/// allowed; request validation rejects it.
pub(crate) fn resolve_token(ctx: &Context, token_arg: Option<&str>) -> Result<String> {
    if let Some(t) = token_arg {
        return Ok(t.to_string());
    }

    if !ctx.interactive {
        return Ok(String::new());
    }

    // Interactive prompt with masked input
    print!("SonarCloud token: ");
    io::stdout().flush()?;

    rpassword::read_password().context("Failed to read token")
}
