//! Raw facts gathered from git and the review tool.
//!
//! These are plain records with no status logic of their own. The git side
//! is filled in by [`crate::core::git::GitRepo`], the pull-request side is
//! parsed from `gh` output by [`PrRecord::parse`] and [`CiState::parse`].

use crate::core::status::Status;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Relationship between a branch and its upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamRelation {
    Ahead,
    Behind,
    Synced,
    Mixed,
}

impl UpstreamRelation {
    pub fn from_counts(ahead: usize, behind: usize) -> Self {
        match (ahead > 0, behind > 0) {
            (true, true) => UpstreamRelation::Mixed,
            (true, false) => UpstreamRelation::Ahead,
            (false, true) => UpstreamRelation::Behind,
            (false, false) => UpstreamRelation::Synced,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            UpstreamRelation::Ahead => Status::RemoteAhead,
            UpstreamRelation::Behind => Status::RemoteBehind,
            UpstreamRelation::Synced => Status::RemoteSynced,
            UpstreamRelation::Mixed => Status::RemoteMixed,
        }
    }
}

/// One local branch as seen by the timing/tracking feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingRecord {
    pub commit_timestamp: i64,
    pub name: String,
    /// Upstream configured, even when its ref is gone
    pub tracking: bool,
    pub relation: Option<UpstreamRelation>,
    /// Working copy that has this branch checked out
    pub worktree: Option<PathBuf>,
}

impl TimingRecord {
    pub fn local(name: impl Into<String>, commit_timestamp: i64) -> Self {
        Self {
            commit_timestamp,
            name: name.into(),
            tracking: false,
            relation: None,
            worktree: None,
        }
    }

    pub fn tracking(mut self, relation: UpstreamRelation) -> Self {
        self.tracking = true;
        self.relation = Some(relation);
        self
    }

    pub fn checked_out_at(mut self, worktree: impl Into<PathBuf>) -> Self {
        self.worktree = Some(worktree.into());
        self
    }
}

/// A checkout event from the `HEAD` reflog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutEvent {
    pub timestamp: i64,
    pub branch: String,
}

impl CheckoutEvent {
    pub fn new(timestamp: i64, branch: impl Into<String>) -> Self {
        Self {
            timestamp,
            branch: branch.into(),
        }
    }

    /// Recognize `checkout: moving from <a> to <b>` reflog messages
    pub fn from_reflog(timestamp: i64, message: &str) -> Option<Self> {
        let moves = message.strip_prefix("checkout: moving from ")?;
        let (_, target) = moves.rsplit_once(" to ")?;
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        Some(Self::new(timestamp, target))
    }
}

/// Everything the local repository reports, before any status logic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFacts {
    /// Branch `HEAD` points at, if any
    pub current: Option<String>,
    pub timing: Vec<TimingRecord>,
    pub checkouts: Vec<CheckoutEvent>,
    /// Branches merged into the current reference
    pub merged: Vec<String>,
    /// Remote name to the branch names visible on it
    pub remotes: BTreeMap<String, Vec<String>>,
}

/// Pull-request state as reported by the review tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    Closed,
    Merged,
    Draft,
}

impl PrState {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Some(PrState::Open),
            "closed" => Some(PrState::Closed),
            "merged" => Some(PrState::Merged),
            "draft" => Some(PrState::Draft),
            _ => None,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            PrState::Open => Status::PrOpen,
            PrState::Closed => Status::PrClosed,
            PrState::Merged => Status::PrMerged,
            PrState::Draft => Status::PrDraft,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Requested,
    Other,
}

impl ReviewState {
    fn parse(annotation: &str) -> Self {
        let normalized = annotation
            .trim()
            .to_ascii_lowercase()
            .replace(['_', '-'], " ");
        match normalized.as_str() {
            "approved" => ReviewState::Approved,
            "changes requested" => ReviewState::ChangesRequested,
            "commented" => ReviewState::Commented,
            "requested" | "review requested" => ReviewState::Requested,
            _ => ReviewState::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reviewer {
    pub login: String,
    pub state: ReviewState,
}

impl Reviewer {
    fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        let (login, state) = match entry.split_once(" (") {
            Some((login, rest)) => (login, ReviewState::parse(rest.trim_end_matches(')'))),
            None => (entry, ReviewState::Other),
        };
        Some(Self {
            login: login.trim().to_string(),
            state,
        })
    }
}

/// The loosely structured `gh pr view` record for one branch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrRecord {
    pub url: Option<String>,
    pub state: Option<PrState>,
    pub reviewers: Vec<Reviewer>,
}

impl PrRecord {
    /// Parse `field:<tab>value` lines; unknown fields are ignored and the
    /// first recognizable `state:` wins
    pub fn parse(text: &str) -> Self {
        let mut record = PrRecord::default();
        for line in text.lines() {
            // `--` separates the metadata header from the free-text body
            if line.trim_end() == "--" {
                break;
            }
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match field.trim().to_ascii_lowercase().as_str() {
                "url" if record.url.is_none() && !value.is_empty() => {
                    record.url = Some(value.to_string());
                }
                "state" if record.state.is_none() => {
                    record.state = PrState::parse(value);
                }
                "reviewers" if record.reviewers.is_empty() => {
                    record.reviewers = value.split(',').filter_map(Reviewer::parse).collect();
                }
                _ => {}
            }
        }
        record
    }

    pub fn any_reviewer(&self, state: ReviewState) -> bool {
        self.reviewers.iter().any(|reviewer| reviewer.state == state)
    }

    /// Every listed reviewer approved; never true for an empty list
    pub fn all_approved(&self) -> bool {
        !self.reviewers.is_empty()
            && self
                .reviewers
                .iter()
                .all(|reviewer| reviewer.state == ReviewState::Approved)
    }
}

/// Aggregate CI outcome of one pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiState {
    Fail,
    Pending,
    Pass,
}

impl CiState {
    /// Reduce tab-delimited `gh pr checks` rows: any failure wins, then any
    /// pending check, then a pass. No signal at all reads as pending.
    pub fn parse(text: &str) -> Self {
        let mut seen_pending = false;
        let mut seen_pass = false;
        for row in text.lines() {
            for field in row.split('\t').map(str::trim) {
                match field {
                    "fail" => return CiState::Fail,
                    "pending" => seen_pending = true,
                    "pass" => seen_pass = true,
                    _ => {}
                }
            }
        }
        if seen_pending || !seen_pass {
            CiState::Pending
        } else {
            CiState::Pass
        }
    }

    pub fn status(&self) -> Status {
        match self {
            CiState::Fail => Status::CiFail,
            CiState::Pending => Status::CiPending,
            CiState::Pass => Status::CiPass,
        }
    }
}
