//! Core types and errors for the dependency confusion auditor.

use thiserror::Error;

/// Errors that can occur during an audit run.
#[derive(Error, Debug)]
pub enum ConfuscanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest parse error: {0}")]
    ManifestParse(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("authentication error: {0}")]
    Auth(String),
}

pub type Result<T> = std::result::Result<T, ConfuscanError>;

/// Tally of per-dependency verdicts across one or more manifests.
///
/// For a manifest declaring N dependencies, `exists + missing + skipped == N`
/// always holds: every check lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Packages confirmed claimed on the registry.
    pub exists: usize,
    /// Packages the registry does not know (potential confusion targets).
    pub missing: usize,
    /// Checks abandoned due to transport errors.
    pub skipped: usize,
}

impl Summary {
    /// Total number of dependency checks attempted.
    pub fn total(&self) -> usize {
        self.exists + self.missing + self.skipped
    }

    /// Fold another summary into this one.
    pub fn merge(&mut self, other: Summary) {
        self.exists += other.exists;
        self.missing += other.missing;
        self.skipped += other.skipped;
    }
}
