//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

/// sonar-harvest - Pull complete SonarCloud issue sets past the search ceiling
#[derive(Parser, Debug)]
#[command(name = "sonar-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if sonar-harvest was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; never prompts
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Whether prompts may be shown: not quiet and stdin is a terminal.
    pub fn interactive(&self) -> bool {
        !self.quiet && std::io::stdin().is_terminal()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Harvest every issue of one or more projects into a JSON report
    #[command(
        name = "harvest",
        long_about = "Harvest every issue of one or more projects into a JSON report.\n\n\
            The issue search API stops at 10,000 results per query. harvest splits each \
            project by severity, type and status, and re-queries saturated severities \
            in creation-date windows, so large projects are retrieved completely. \
            Issues are deduplicated per project.\n\n\
            The report is written even when the harvest fails part way; it then holds \
            the error and the issues of every project completed before it.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Harvest two projects (token from $SONAR_TOKEN)
    sonar-harvest harvest my-org_backend my-org_frontend

    # Write the report to a specific file
    sonar-harvest harvest my-org_backend --output backend.json

    # Against a self-hosted SonarQube
    sonar-harvest harvest core --base-url https://sonar.example.com

EXIT STATUS:
    0  report written, harvest complete
    1  harvest failed (report holds partial results)
    2  invalid input (missing token, malformed project key)"
    )]
    Harvest {
        /// Project keys, harvested in the given order
        #[arg(value_name = "PROJECT", required = true)]
        projects: Vec<String>,

        /// Report file (default: sonar-report-YYYY-MM-DD.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// User token (prompted for when omitted and interactive)
        #[arg(long, env = "SONAR_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Server URL (overrides config)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// List the projects of an organization
    #[command(
        name = "projects",
        after_help = "\
WORKFLOW EXAMPLES:
    # Find project keys to harvest
    sonar-harvest projects --organization my-org"
    )]
    Projects {
        /// Organization key (default: `organization` from config)
        #[arg(long)]
        organization: Option<String>,

        /// User token (prompted for when omitted and interactive)
        #[arg(long, env = "SONAR_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Server URL (overrides config)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// Show the effective configuration
    #[command(name = "config")]
    Config,

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    sonar-harvest completion bash > ~/.local/share/bash-completion/completions/sonar-harvest

    # Zsh
    sonar-harvest completion zsh > ~/.zfunc/_sonar-harvest

    # Fish
    sonar-harvest completion fish > ~/.config/fish/completions/sonar-harvest.fish

    # PowerShell
    sonar-harvest completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
