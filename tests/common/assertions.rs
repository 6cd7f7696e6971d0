//! Common assertion helpers for test output validation

#![allow(dead_code)]

use predicates::prelude::*;

/// Creates a predicate that checks for git repository error messages
pub fn not_in_git_repo() -> impl Predicate<str> {
    predicates::str::contains("Not in a git repository")
}

/// Creates a predicate that checks for the colored error banner
pub fn has_error_banner() -> impl Predicate<str> {
    predicates::str::contains("Error:")
}

/// Creates a predicate that checks for the default `merged` background
pub fn has_merged_background() -> impl Predicate<str> {
    predicates::str::contains("\x1b[48;2;58;58;58m")
}

/// Parses `--json` output of a run
pub fn parse_report(stdout: &[u8]) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::from_slice(stdout)?)
}

/// Branch names listed under `key` in a parsed report
pub fn members(report: &serde_json::Value, key: &str) -> Vec<String> {
    report["statuses"][key]
        .as_array()
        .map(|names| {
            names
                .iter()
                .filter_map(|name| name.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
