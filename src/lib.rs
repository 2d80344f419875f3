//! confuscan - dependency confusion auditor for npm manifests.
//!
//! This library provides tools for detecting dependency confusion risk by:
//! - Parsing package.json manifests (local files or bulk-discovered)
//! - Checking every declared dependency against the npm registry
//! - Replaying GitDorker search results through the GitHub code-search API
//!   to find exposed manifests in the wild
//!
//! All outbound calls are paced by an adaptive rate limiter that combines a
//! token bucket with the quota headers reported by the GitHub API.
//!
//! # Example
//!
//! ```no_run
//! use confuscan::{ApiLimiter, Manifest, NpmChecker, Scanner};
//! use confuscan::report::ConsoleReport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let limiter = Arc::new(ApiLimiter::new(29));
//!     let checker = NpmChecker::new(30, limiter).unwrap();
//!     let scanner = Scanner::new(checker, ConsoleReport::new());
//!
//!     let manifest = Manifest::load("package.json".as_ref()).unwrap();
//!     let summary = scanner.check_manifest(&manifest).await;
//!     println!("{} packages unclaimed", summary.missing);
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod limiter;
pub mod manifest;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod types;

pub use config::{Config, Mode};
pub use discovery::GitdorkerDriver;
pub use limiter::{ApiLimiter, Clock, SystemClock};
pub use manifest::Manifest;
pub use registry::NpmChecker;
pub use scanner::Scanner;
pub use types::{ConfuscanError, Result, Summary};
