//! Git repository access.
//!
//! This module provides [`GitRepo`], a thin wrapper over `git2` that reads
//! every local fact the status pipeline needs and the `brief.*` configuration.
//!
//! # Key Features
//! - **Branch timing**: tip commit time, upstream relation, worktree membership
//! - **Checkout history**: `checkout: moving from A to B` entries of the `HEAD` reflog
//! - **Merge membership**: branches whose tip is reachable from `HEAD`
//! - **Remote listing**: branch names on every configured remote
//! - **Configuration**: `brief.*` entries from all scopes or the local scope only

use crate::core::{
    error::{BriefError, Result},
    facts::{CheckoutEvent, LocalFacts, TimingRecord, UpstreamRelation},
};
use git2::{Branch, BranchType, ConfigLevel, Oid, Repository};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path)?;
        Ok(GitRepo { repo })
    }

    pub fn get_repo_path(&self) -> PathBuf {
        self.repo.path().to_path_buf()
    }

    /// Working directory, or the git directory of a bare repository
    pub fn get_workdir(&self) -> PathBuf {
        self.repo
            .workdir()
            .unwrap_or_else(|| self.repo.path())
            .to_path_buf()
    }

    /// Branch `HEAD` points at; `None` when detached or unborn
    pub fn get_current_branch(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        if !head.is_branch() {
            return None;
        }
        head.shorthand().map(str::to_string)
    }

    /// Gather every local fact in one pass
    pub fn local_facts(&self) -> Result<LocalFacts> {
        let facts = LocalFacts {
            current: self.get_current_branch(),
            timing: self.timing_records()?,
            checkouts: self.checkout_events(),
            merged: self.merged_branches()?,
            remotes: self.remote_branches()?,
        };
        log::debug!(
            "Read {} branches, {} checkout events, {} remotes",
            facts.timing.len(),
            facts.checkouts.len(),
            facts.remotes.len()
        );
        Ok(facts)
    }

    fn local_branches(&self) -> Result<Vec<(String, Branch<'_>)>> {
        let mut branches = Vec::new();
        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            let Some(name) = branch.name()?.map(str::to_string) else {
                log::warn!("Skipping branch with a non UTF-8 name");
                continue;
            };
            branches.push((name, branch));
        }
        Ok(branches)
    }

    pub fn timing_records(&self) -> Result<Vec<TimingRecord>> {
        let worktrees = self.checked_out_branches();
        let mut records = Vec::new();

        for (name, branch) in self.local_branches()? {
            let commit = branch.get().peel_to_commit()?;
            let mut record = TimingRecord::local(&name, commit.time().seconds());

            // A configured upstream counts even after its ref was pruned
            if let Some(upstream) = self.configured_upstream(&branch) {
                record.tracking = true;
                record.relation = self
                    .repo
                    .refname_to_id(&upstream)
                    .ok()
                    .and_then(|upstream_oid| self.upstream_relation(commit.id(), upstream_oid));
            }
            record.worktree = worktrees.get(&name).cloned();
            records.push(record);
        }

        Ok(records)
    }

    /// Full ref name of the branch's configured upstream, resolvable or not
    fn configured_upstream(&self, branch: &Branch<'_>) -> Option<String> {
        let refname = branch.get().name()?;
        let upstream = self.repo.branch_upstream_name(refname).ok()?;
        upstream.as_str().map(str::to_string)
    }

    fn upstream_relation(&self, local: Oid, upstream: Oid) -> Option<UpstreamRelation> {
        match self.repo.graph_ahead_behind(local, upstream) {
            Ok((ahead, behind)) => Some(UpstreamRelation::from_counts(ahead, behind)),
            Err(e) => {
                log::debug!("Could not compare {local} with upstream {upstream}: {e}");
                None
            }
        }
    }

    /// Branch name to the working copy that has it checked out
    fn checked_out_branches(&self) -> HashMap<String, PathBuf> {
        let mut checked_out = HashMap::new();

        if let (Some(branch), Some(workdir)) = (self.get_current_branch(), self.repo.workdir()) {
            checked_out.insert(branch, workdir.to_path_buf());
        }

        let Ok(names) = self.repo.worktrees() else {
            return checked_out;
        };
        for name in names.iter().flatten() {
            let Ok(worktree) = self.repo.find_worktree(name) else {
                continue;
            };
            let Ok(repo) = Repository::open_from_worktree(&worktree) else {
                log::debug!("Skipping unreadable worktree '{name}'");
                continue;
            };
            let Ok(head) = repo.head() else {
                continue;
            };
            if let (true, Some(branch)) = (head.is_branch(), head.shorthand()) {
                checked_out.insert(branch.to_string(), worktree.path().to_path_buf());
            }
        }

        checked_out
    }

    /// Checkout events from the `HEAD` reflog, newest first
    pub fn checkout_events(&self) -> Vec<CheckoutEvent> {
        let Ok(reflog) = self.repo.reflog("HEAD") else {
            return Vec::new();
        };
        reflog
            .iter()
            .filter_map(|entry| {
                let message = entry.message()?;
                CheckoutEvent::from_reflog(entry.committer().when().seconds(), message)
            })
            .collect()
    }

    /// Local branches whose tip is reachable from `HEAD`
    pub fn merged_branches(&self) -> Result<Vec<String>> {
        let Some(head) = self.repo.head().ok().and_then(|head| head.target()) else {
            return Ok(Vec::new());
        };

        let mut merged = Vec::new();
        for (name, branch) in self.local_branches()? {
            let Some(tip) = branch.get().target() else {
                continue;
            };
            if tip == head || self.repo.graph_descendant_of(head, tip)? {
                merged.push(name);
            }
        }
        Ok(merged)
    }

    /// Remote name to the branch names it carries
    pub fn remote_branches(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut remotes: BTreeMap<String, Vec<String>> = self
            .repo
            .remotes()?
            .iter()
            .flatten()
            .map(|remote| (remote.to_string(), Vec::new()))
            .collect();
        // Remote names may contain `/`, so match on the longest name
        let prefixes: Vec<(String, String)> = remotes
            .keys()
            .map(|remote| (format!("refs/remotes/{remote}/"), remote.clone()))
            .collect();

        for entry in self.repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = entry?;
            let Some(refname) = branch.get().name() else {
                continue;
            };
            let Some((remote, name)) = prefixes
                .iter()
                .filter_map(|(prefix, remote)| Some((remote, refname.strip_prefix(prefix)?)))
                .max_by_key(|(remote, _)| remote.len())
            else {
                continue;
            };
            if name == "HEAD" {
                continue;
            }
            if let Some(names) = remotes.get_mut(remote) {
                names.push(name.to_string());
            }
        }

        Ok(remotes)
    }

    /// `(name, value)` pairs of every configuration entry whose name matches
    /// `pattern`, in the order git reads them. `local_only` restricts the
    /// lookup to the repository's own config file.
    pub fn config_entries(&self, pattern: &str, local_only: bool) -> Result<Vec<(String, String)>> {
        let config = self.repo.config()?;
        let mut config = if local_only {
            match config.open_level(ConfigLevel::Local) {
                Ok(local) => local,
                Err(e) => {
                    log::debug!("No local configuration: {e}");
                    return Ok(Vec::new());
                }
            }
        } else {
            config
        };
        let snapshot = config.snapshot()?;

        let mut pairs = Vec::new();
        let mut entries = snapshot.entries(Some(pattern))?;
        while let Some(entry) = entries.next() {
            let entry = entry?;
            let Some(name) = entry.name() else {
                continue;
            };
            // A bare `key` line without `= value` is boolean true
            let value = entry.value().unwrap_or("true");
            pairs.push((name.to_string(), value.to_string()));
        }
        Ok(pairs)
    }

    pub fn config_string(&self, name: &str) -> Option<String> {
        self.repo.config().ok()?.get_string(name).ok()
    }
}

/// Open the repository containing `path`, mapping failure to the friendly
/// not-in-a-repository error
pub fn open_repository(path: &Path) -> Result<GitRepo> {
    GitRepo::open(path).map_err(|e| {
        log::debug!("Repository discovery failed: {e}");
        BriefError::NotInGitRepo
    })
}
