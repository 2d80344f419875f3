//! Per-manifest check loop shared by both modes.

use crate::manifest::Manifest;
use crate::registry::NpmChecker;
use crate::report::ConsoleReport;
use crate::types::Summary;
use tracing::debug;

/// Runs every declared dependency of a manifest through the registry
/// existence check, sequentially, and tallies the verdicts.
pub struct Scanner {
    checker: NpmChecker,
    console: ConsoleReport,
}

impl Scanner {
    pub fn new(checker: NpmChecker, console: ConsoleReport) -> Self {
        Self { checker, console }
    }

    /// Check all dependencies of one manifest.
    ///
    /// Transport errors skip the affected dependency and never abort the
    /// batch; the returned summary accounts for every declared dependency.
    pub async fn check_manifest(&self, manifest: &Manifest) -> Summary {
        let mut summary = Summary::default();

        for (name, version) in &manifest.dependencies {
            self.console.print_check_start(name, version);
            match self.checker.exists(name).await {
                Ok(true) => {
                    self.console.print_exists();
                    summary.exists += 1;
                }
                Ok(false) => {
                    self.console.print_missing();
                    summary.missing += 1;
                }
                Err(e) => {
                    self.console.print_check_error(&e);
                    debug!("skipping {}: {}", name, e);
                    summary.skipped += 1;
                }
            }
        }

        summary
    }
}
