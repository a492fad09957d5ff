//! config command - Show the effective configuration

use anyhow::{Context as _, Result};

use super::load_config;
use crate::cli::Context;

/// Print the effective configuration as TOML, with its sources.
pub fn config(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;

    match config.global_config_loaded_from() {
        Some(path) => println!("# global: {}", path.display()),
        None => println!("# global: (none)"),
    }
    match config.local_config_loaded_from() {
        Some(path) => println!("# local: {}", path.display()),
        None => println!("# local: (none)"),
    }

    let rendered =
        toml::to_string_pretty(&config.effective()).context("Failed to render config")?;
    print!("{}", rendered);

    Ok(())
}
