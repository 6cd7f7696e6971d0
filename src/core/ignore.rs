//! Ignore filter.
//!
//! `brief.ignore.<key>` lists branch names that must never hold `<key>`;
//! `brief.ignore.all` lists branches dropped from every key and from the
//! report itself. Names are literals matched against the whole branch name.

use crate::core::error::{BriefError, Result};
use crate::core::state::BranchReport;
use crate::core::status::{KeyOrder, StatusKey};
use regex::Regex;
use std::collections::BTreeMap;

/// Scope of one ignore list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IgnoreScope {
    All,
    Key(StatusKey),
}

/// Raw ignore lists as read from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    lists: BTreeMap<IgnoreScope, Vec<String>>,
}

impl IgnoreRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<I, S>(&mut self, scope: IgnoreScope, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lists
            .entry(scope)
            .or_default()
            .extend(names.into_iter().map(Into::into));
    }

    pub fn names(&self, scope: IgnoreScope) -> &[String] {
        self.lists.get(&scope).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.lists.values().all(Vec::is_empty)
    }
}

/// Compiled per-key exclusion patterns
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    patterns: BTreeMap<StatusKey, Regex>,
    all: Option<Regex>,
}

impl IgnoreFilter {
    pub fn new(order: &KeyOrder, rules: &IgnoreRules) -> Result<Self> {
        let all_names = rules.names(IgnoreScope::All);
        let all = whole_name_pattern(all_names)?;

        let mut patterns = BTreeMap::new();
        for key in order.iter() {
            let names: Vec<String> = rules
                .names(IgnoreScope::Key(key))
                .iter()
                .chain(all_names)
                .cloned()
                .collect();
            if let Some(pattern) = whole_name_pattern(&names)? {
                patterns.insert(key, pattern);
            }
        }

        Ok(Self { patterns, all })
    }

    /// Remove matching branches from each key's membership and hide
    /// branches matched by the `all` list
    pub fn apply(&self, report: &mut BranchReport) {
        for (key, pattern) in &self.patterns {
            if let Some(members) = report.matrix.members_mut(*key) {
                members.retain(|branch| {
                    let ignored = pattern.is_match(branch);
                    if ignored {
                        log::debug!("Ignoring '{key}' for '{branch}'");
                    }
                    !ignored
                });
            }
        }

        if let Some(all) = &self.all {
            let hidden: Vec<String> = report
                .branches
                .keys()
                .filter(|name| all.is_match(name))
                .cloned()
                .collect();
            report.hidden.extend(hidden);
        }
    }
}

fn whole_name_pattern(names: &[String]) -> Result<Option<Regex>> {
    if names.is_empty() {
        return Ok(None);
    }
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("^(?:{alternation})$"))
        .map(Some)
        .map_err(|e| BriefError::invalid_option_value("brief.ignore", e.to_string()))
}
