//! projects command - List the projects of an organization

use anyhow::{anyhow, Context as _, Result};

use super::{load_config, resolve_token};
use crate::cli::Context;
use crate::harvest::RequestError;
use crate::source::sonarcloud::SonarCloudSource;
use crate::source::IssueSource;
use crate::ui::output::{self, Verbosity};

/// Run the projects command.
pub fn projects(
    ctx: &Context,
    organization: Option<&str>,
    token: Option<&str>,
    base_url: Option<&str>,
) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let config = load_config(ctx)?;

    let organization = organization
        .or(config.organization())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No organization. Use --organization <ORG> or set `organization` in config."))?;

    let token = resolve_token(ctx, token)?;
    let token = token.trim();
    if token.is_empty() {
        return Err(RequestError::MissingToken.into());
    }

    let source = SonarCloudSource::new(
        token,
        base_url.unwrap_or_else(|| config.base_url()),
        config.request_timeout(),
    )?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let projects = rt
        .block_on(source.list_projects(&organization))
        .with_context(|| format!("Failed to list projects of {}", organization))?;

    for project in &projects {
        println!("{}  {}", project.key, project.name);
    }
    output::print(
        format!("{} project(s) in {}", projects.len(), organization),
        verbosity,
    );

    Ok(())
}
