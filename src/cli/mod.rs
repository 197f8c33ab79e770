pub mod explain;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

use crate::types::Severity;

#[derive(Parser, Debug)]
#[command(
    name = "playlint",
    version,
    about = "Lint playbooks, task files, roles and variable files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lint YAML automation content
    Check {
        /// Project root directory to scan
        path: PathBuf,

        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Path to config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Minimum severity that causes a non-zero exit code
        #[arg(long, default_value = "warning")]
        fail_on: Severity,
    },
    /// Create a default .playlint.toml
    Init,
    /// Explain what a rule checks (omit rule to list all)
    Explain {
        /// Rule id or tag (e.g., var-naming, var-naming[pattern], 403)
        rule: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Github,
}
