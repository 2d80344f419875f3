//! Bulk discovery of exposed manifests from GitDorker output.
//!
//! GitDorker emits lines containing GitHub web-search URLs. The driver picks
//! out the searches scoped to `filename:package.json`, replays each through
//! the code-search API, resolves every hit to its raw-content URL, and runs
//! the discovered manifests through the shared check loop.

use crate::limiter::ApiLimiter;
use crate::manifest::Manifest;
use crate::report::ConsoleReport;
use crate::scanner::Scanner;
use crate::types::{Result, Summary};
use regex::Regex;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Lines carrying a code search scoped to package.json manifests.
const SEARCH_LINE_PATTERN: &str = r"https://github\.com/search\?q=.*filename%3Apackage\.json.*";

const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com";

/// Code-search API response. Anything that fails to deserialize into this
/// shape counts as "no results", not an error.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    html_url: String,
}

/// Driver for the bulk discovery pipeline.
pub struct GitdorkerDriver {
    client: Client,
    token: String,
    limiter: Arc<ApiLimiter>,
    scanner: Scanner,
    console: ConsoleReport,
    search_line: Regex,
    api_base: String,
    raw_base: String,
}

impl GitdorkerDriver {
    pub fn new(
        token: &str,
        timeout_secs: u64,
        limiter: Arc<ApiLimiter>,
        scanner: Scanner,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("confuscan/0.1")
            .build()?;

        Ok(Self {
            client,
            token: token.to_string(),
            limiter,
            scanner,
            console: ConsoleReport::new(),
            search_line: Regex::new(SEARCH_LINE_PATTERN).expect("search line pattern is valid"),
            api_base: DEFAULT_API_BASE.to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
        })
    }

    /// Point the driver at a different code-search API host (GHE, tests).
    pub fn with_api_base(mut self, url: &str) -> Self {
        self.api_base = url.trim_end_matches('/').to_string();
        self
    }

    /// Point the driver at a different raw-content host (GHE, tests).
    pub fn with_raw_base(mut self, url: &str) -> Self {
        self.raw_base = url.trim_end_matches('/').to_string();
        self
    }

    /// Stream the results file and process every matching search URL.
    ///
    /// A single forward pass over the lines; an unreadable file is fatal,
    /// everything past that is logged and skipped.
    pub async fn run(&self, results_path: &Path) -> Result<Summary> {
        let file = File::open(results_path)?;
        let reader = BufReader::new(file);

        let mut summary = Summary::default();
        for line in reader.lines() {
            let line = line?;
            if let Some(m) = self.search_line.find(&line) {
                let search_url = m.as_str();
                self.console
                    .print_info(&format!("Processing results from: {}", search_url));
                let api_url = rewrite_search_url(search_url, &self.api_base);
                self.process_search(&api_url, &mut summary).await;
            }
        }

        Ok(summary)
    }

    /// Replay one search through the code-search API and walk its hits.
    async fn process_search(&self, api_url: &str, summary: &mut Summary) {
        self.limiter.admit().await;

        let response = match self
            .client
            .get(api_url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github.v3+json")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("search request failed: {}", e);
                return;
            }
        };
        self.limiter.record_headers(response.headers());

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("failed to read search response: {}", e);
                return;
            }
        };

        let items = match serde_json::from_str::<SearchResponse>(&body) {
            Ok(parsed) if !parsed.items.is_empty() => parsed.items,
            _ => {
                self.console.print_info("No results found");
                return;
            }
        };

        for item in items {
            let raw_url = rewrite_blob_url(&item.html_url, &self.raw_base);
            self.console
                .print_info(&format!("Checking package.json: {}", raw_url));
            self.check_manifest_url(&raw_url, summary).await;
        }
    }

    /// Fetch one discovered manifest and check its dependencies.
    async fn check_manifest_url(&self, raw_url: &str, summary: &mut Summary) {
        self.limiter.admit().await;

        let response = match self
            .client
            .get(raw_url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("failed to fetch {}: {}", raw_url, e);
                return;
            }
        };
        self.limiter.record_headers(response.headers());

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("failed to read {}: {}", raw_url, e);
                return;
            }
        };

        let manifest = match Manifest::parse(&body) {
            Ok(m) => m,
            Err(e) => {
                warn!("skipping {}: {}", raw_url, e);
                return;
            }
        };

        summary.merge(self.scanner.check_manifest(&manifest).await);
        println!();
    }
}

/// Rewrite a GitHub web-search URL into its code-search API equivalent:
/// `https://github.com/search?q=X` -> `{api_base}/search/code?q=X`.
fn rewrite_search_url(search_url: &str, api_base: &str) -> String {
    match search_url.strip_prefix("https://github.com/search") {
        Some(rest) => format!("{}/search/code{}", api_base, rest),
        None => search_url.to_string(),
    }
}

/// Rewrite a web blob URL into its raw-content equivalent:
/// `https://github.com/org/repo/blob/main/package.json` ->
/// `{raw_base}/org/repo/main/package.json`.
fn rewrite_blob_url(html_url: &str, raw_base: &str) -> String {
    match html_url.strip_prefix("https://github.com/") {
        Some(rest) => format!("{}/{}", raw_base, rest.replacen("/blob/", "/", 1)),
        None => html_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NpmChecker;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_rewrite_search_url() {
        assert_eq!(
            rewrite_search_url("https://github.com/search?q=X", DEFAULT_API_BASE),
            "https://api.github.com/search/code?q=X"
        );
    }

    #[test]
    fn test_rewrite_blob_url() {
        assert_eq!(
            rewrite_blob_url(
                "https://github.com/org/repo/blob/main/package.json",
                DEFAULT_RAW_BASE
            ),
            "https://raw.githubusercontent.com/org/repo/main/package.json"
        );
    }

    #[test]
    fn test_search_line_pattern() {
        let re = Regex::new(SEARCH_LINE_PATTERN).unwrap();
        assert!(re.is_match(
            "found: https://github.com/search?q=org%3Aacme+filename%3Apackage.json&type=code"
        ));
        assert!(!re.is_match("https://github.com/search?q=filename%3Arequirements.txt"));
        assert!(!re.is_match("no urls here"));
    }

    fn make_driver(server_url: &str) -> GitdorkerDriver {
        let limiter = Arc::new(ApiLimiter::new(6000));
        let checker = NpmChecker::new(10, limiter.clone())
            .unwrap()
            .with_registry_url(server_url);
        let scanner = Scanner::new(checker, ConsoleReport::new());
        GitdorkerDriver::new("test-token", 10, limiter, scanner)
            .unwrap()
            .with_api_base(server_url)
            .with_raw_base(server_url)
    }

    fn results_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[tokio::test]
    async fn test_no_matching_lines_issues_no_api_calls() {
        let mut server = mockito::Server::new_async().await;
        let search = server
            .mock("GET", "/search/code")
            .match_query(mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let driver = make_driver(&server.url());
        let file = results_file(&["just some noise", "https://github.com/unrelated"]);

        let summary = driver.run(file.path()).await.unwrap();

        assert_eq!(summary, Summary::default());
        search.assert_async().await;
    }

    #[tokio::test]
    async fn test_one_matching_line_issues_one_search_call() {
        let mut server = mockito::Server::new_async().await;
        let search = server
            .mock("GET", "/search/code")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"items": []}"#)
            .expect(1)
            .create_async()
            .await;

        let driver = make_driver(&server.url());
        let file = results_file(&[
            "noise before",
            "https://github.com/search?q=org%3Aacme+filename%3Apackage.json",
        ]);

        driver.run(file.path()).await.unwrap();
        search.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_search_response_counts_as_no_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search/code")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("<html>rate limited</html>")
            .create_async()
            .await;

        let driver = make_driver(&server.url());
        let file = results_file(&["https://github.com/search?q=filename%3Apackage.json"]);

        let summary = driver.run(file.path()).await.unwrap();
        assert_eq!(summary, Summary::default());
    }

    #[tokio::test]
    async fn test_full_pipeline_checks_discovered_dependencies() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/search/code")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"items": [{"html_url": "https://github.com/acme/app/blob/main/package.json"}]}"#,
            )
            .create_async()
            .await;

        server
            .mock("GET", "/acme/app/main/package.json")
            .with_status(200)
            .with_body(
                r#"{"dependencies": {"left-pad": "1.3.0", "totally-fake-pkg-xyz123": "1.0.0"}}"#,
            )
            .create_async()
            .await;

        server
            .mock("GET", "/left-pad")
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("GET", "/totally-fake-pkg-xyz123")
            .with_status(404)
            .create_async()
            .await;

        let driver = make_driver(&server.url());
        let file = results_file(&["https://github.com/search?q=filename%3Apackage.json"]);

        let summary = driver.run(file.path()).await.unwrap();

        assert_eq!(summary.exists, 1);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.skipped, 0);
    }

    #[tokio::test]
    async fn test_unparsable_manifest_is_skipped() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/search/code")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"items": [{"html_url": "https://github.com/acme/app/blob/main/package.json"}]}"#,
            )
            .create_async()
            .await;

        server
            .mock("GET", "/acme/app/main/package.json")
            .with_status(200)
            .with_body("#!/usr/bin/env node")
            .create_async()
            .await;

        let driver = make_driver(&server.url());
        let file = results_file(&["https://github.com/search?q=filename%3Apackage.json"]);

        let summary = driver.run(file.path()).await.unwrap();
        assert_eq!(summary, Summary::default());
    }
}
