//! package.json manifest loading and parsing.

use crate::types::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A parsed dependency manifest.
///
/// Only the `dependencies` field is extracted; every other field is ignored.
/// A manifest without a `dependencies` field parses to an empty map rather
/// than failing. Version specifiers are kept as opaque strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    /// Package name -> declared version specifier. BTreeMap keeps check
    /// order (and console output) deterministic.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl Manifest {
    /// Load and parse a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse manifest content, e.g. a body fetched over HTTP.
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Number of declared dependencies.
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}
