//! Per-run branch state and the persisted pull-request cache.
//!
//! This module defines the data every pipeline stage reads and writes, plus
//! the only state that outlives a run: the cache of branches whose pull
//! request is merged.
//!
//! # Public API
//! - [`Branch`]: a local branch with commit and checkout times
//! - [`BranchReport`]: branches, status matrix, PR URLs and hidden branches
//! - [`PrCache`]: `pr-merged` facts remembered between runs
//!
//! # Cache Strategy
//! - **JSON serialization**: human-readable cache file for debugging
//! - **Repository isolation**: one cache file per repository path
//! - **Merged only**: a merged pull request never changes again, every other
//!   pull-request fact is fetched fresh each run

use crate::core::error::{BriefError, Result};
use crate::core::status::{KeyOrder, StatusMatrix};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const PR_CACHE_FILE: &str = "pr-merged.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub commit_timestamp: i64,
    pub checkout_timestamp: Option<i64>,
}

impl Branch {
    pub fn new(name: impl Into<String>, commit_timestamp: i64) -> Self {
        Self {
            name: name.into(),
            commit_timestamp,
            checkout_timestamp: None,
        }
    }

    /// The checkout time when it is strictly later than the commit time,
    /// the commit time otherwise
    pub fn effective_timestamp(&self) -> i64 {
        match self.checkout_timestamp {
            Some(checkout) if checkout > self.commit_timestamp => checkout,
            _ => self.commit_timestamp,
        }
    }

    /// Keep the latest checkout event seen for this branch
    pub fn record_checkout(&mut self, timestamp: i64) {
        if self.checkout_timestamp.map_or(true, |seen| timestamp > seen) {
            self.checkout_timestamp = Some(timestamp);
        }
    }
}

/// Everything known about the branches of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchReport {
    pub branches: BTreeMap<String, Branch>,
    pub matrix: StatusMatrix,
    /// Pull-request URL per branch, when known
    pub urls: BTreeMap<String, String>,
    /// Branches excluded from the report altogether
    pub hidden: BTreeSet<String>,
}

impl BranchReport {
    pub fn new(order: &KeyOrder) -> Self {
        Self {
            branches: BTreeMap::new(),
            matrix: StatusMatrix::with_keys(order),
            urls: BTreeMap::new(),
            hidden: BTreeSet::new(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.branches.keys().cloned().collect()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Branch> {
        self.branches
            .values()
            .filter(|branch| !self.hidden.contains(&branch.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrCacheEntry {
    pub merged: bool,
    pub url: String,
}

/// Remembered `pr-merged` facts, keyed by branch name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, PrCacheEntry>,
}

impl PrCache {
    /// A cache that is never read from or written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache file at `path`. A missing file is an empty cache;
    /// malformed entries are skipped one by one.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => parse_entries(&path, &content),
            Err(e) => {
                log::debug!("No PR cache at '{}': {e}", path.display());
                BTreeMap::new()
            }
        };
        log::debug!("Loaded {} cached merged pull requests", entries.len());
        Self {
            path: Some(path),
            entries,
        }
    }

    /// URL of a cached merged pull request for `branch`
    pub fn merged_url(&self, branch: &str) -> Option<&str> {
        self.entries
            .get(branch)
            .filter(|entry| entry.merged)
            .map(|entry| entry.url.as_str())
    }

    /// Replace the cache content with the branches currently `pr-merged`
    pub fn replace<I>(&mut self, merged: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.entries = merged
            .into_iter()
            .map(|(branch, url)| (branch, PrCacheEntry { merged: true, url }))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the cache back; an empty cache removes the file
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if self.entries.is_empty() {
            if path.exists() {
                fs::remove_file(path).map_err(|e| BriefError::cache_write_failed(path, e))?;
                log::debug!("Cleared PR cache '{}'", path.display());
            }
            return Ok(());
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| BriefError::cache_write_failed(dir, e))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, json).map_err(|e| BriefError::cache_write_failed(path, e))?;
        log::debug!(
            "Saved {} merged pull requests to '{}'",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }
}

fn parse_entries(path: &Path, content: &str) -> BTreeMap<String, PrCacheEntry> {
    let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(content) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Ignoring unreadable PR cache '{}': {e}", path.display());
            return BTreeMap::new();
        }
    };

    raw.into_iter()
        .filter_map(|(branch, value)| match serde_json::from_value::<PrCacheEntry>(value) {
            Ok(entry) => Some((branch, entry)),
            Err(e) => {
                log::warn!("Skipping malformed PR cache entry '{branch}': {e}");
                None
            }
        })
        .collect()
}
