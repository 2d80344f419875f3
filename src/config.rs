//! Configuration handling for the auditor.

use crate::types::{ConfuscanError, Result};
use clap::Parser;
use std::path::PathBuf;

/// Dependency confusion auditor for npm manifests.
#[derive(Parser, Debug, Clone)]
#[command(name = "confuscan")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Path to a package.json manifest to audit
    pub manifest: Option<PathBuf>,

    /// Path to a GitDorker results file (bulk mode)
    #[arg(long, value_name = "FILE")]
    pub gitdorker: Option<PathBuf>,

    /// GitHub API token, required in bulk mode
    #[arg(long, env = "CONFUSCAN_GITHUB_TOKEN", value_name = "TOKEN")]
    pub token: Option<String>,

    /// Rate limit for outbound API calls (requests per minute)
    #[arg(long, default_value = "29")]
    pub rate_limit: u32,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolved operating mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Audit a single local manifest.
    Single(PathBuf),
    /// Scan GitDorker results for exposed manifests.
    Bulk { results: PathBuf, token: String },
    /// Nothing to do; show usage.
    Help,
}

impl Config {
    /// Resolve the operating mode, validating bulk-mode requirements before
    /// any network activity happens.
    pub fn mode(&self) -> Result<Mode> {
        if let Some(ref results) = self.gitdorker {
            let token = self.token.clone().ok_or_else(|| {
                ConfuscanError::Auth(
                    "a GitHub token is required for processing GitDorker results".to_string(),
                )
            })?;
            return Ok(Mode::Bulk {
                results: results.clone(),
                token,
            });
        }

        match self.manifest {
            Some(ref path) => Ok(Mode::Single(path.clone())),
            None => Ok(Mode::Help),
        }
    }
}
