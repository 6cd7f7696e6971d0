//! Type-safe branch status keys and the status matrix.
//!
//! This module defines the fixed catalogue of branch statuses and the ordered
//! key list every later stage walks. Each positive [`Status`] is paired with a
//! negative `non-` form; the two together make a [`StatusKey`].
//!
//! # Public API
//! - [`Status`]: the positive statuses in catalogue order
//! - [`StatusKey`]: a status plus its polarity, spelled `merged` / `non-merged`
//! - [`KeyOrder`]: the immutable ordered key list for one run
//! - [`StatusMatrix`]: key to set-of-branch-names membership
//!
//! # Ordering
//! Catalogue order is significant: it decides style precedence when several
//! held statuses set the same attribute, and it is the unit that gets pruned
//! when pull-request gathering is disabled.

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Positive branch statuses, declared in catalogue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    CheckedOut,
    Merged,
    RemoteTracking,
    RemoteAssociated,
    RemoteAhead,
    RemoteBehind,
    RemoteSynced,
    RemoteMixed,
    PrAssociated,
    PrOpen,
    PrDraft,
    PrMerged,
    PrClosed,
    PrReviewAssigned,
    PrReviewCommented,
    PrReviewChangesRequested,
    PrReviewApproved,
    CiPending,
    CiFail,
    CiPass,
}

impl Status {
    pub const ALL: [Status; 20] = [
        Status::CheckedOut,
        Status::Merged,
        Status::RemoteTracking,
        Status::RemoteAssociated,
        Status::RemoteAhead,
        Status::RemoteBehind,
        Status::RemoteSynced,
        Status::RemoteMixed,
        Status::PrAssociated,
        Status::PrOpen,
        Status::PrDraft,
        Status::PrMerged,
        Status::PrClosed,
        Status::PrReviewAssigned,
        Status::PrReviewCommented,
        Status::PrReviewChangesRequested,
        Status::PrReviewApproved,
        Status::CiPending,
        Status::CiFail,
        Status::CiPass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::CheckedOut => "checked-out",
            Status::Merged => "merged",
            Status::RemoteTracking => "remote-tracking",
            Status::RemoteAssociated => "remote-associated",
            Status::RemoteAhead => "remote-ahead",
            Status::RemoteBehind => "remote-behind",
            Status::RemoteSynced => "remote-synced",
            Status::RemoteMixed => "remote-mixed",
            Status::PrAssociated => "pr-associated",
            Status::PrOpen => "pr-open",
            Status::PrDraft => "pr-draft",
            Status::PrMerged => "pr-merged",
            Status::PrClosed => "pr-closed",
            Status::PrReviewAssigned => "pr-review-assigned",
            Status::PrReviewCommented => "pr-review-commented",
            Status::PrReviewChangesRequested => "pr-review-changes-requested",
            Status::PrReviewApproved => "pr-review-approved",
            Status::CiPending => "ci-pending",
            Status::CiFail => "ci-fail",
            Status::CiPass => "ci-pass",
        }
    }

    pub fn is_pr(&self) -> bool {
        self.as_str().starts_with("pr-")
    }

    pub fn is_ci(&self) -> bool {
        self.as_str().starts_with("ci-")
    }

    pub fn is_remote(&self) -> bool {
        self.as_str().starts_with("remote-")
    }

    pub fn is_review(&self) -> bool {
        self.as_str().starts_with("pr-review-")
    }

    /// The four mutually exclusive upstream relations
    pub fn is_upstream_relation(&self) -> bool {
        matches!(
            self,
            Status::RemoteAhead | Status::RemoteBehind | Status::RemoteSynced | Status::RemoteMixed
        )
    }

    pub fn positive(self) -> StatusKey {
        StatusKey {
            status: self,
            negated: false,
        }
    }

    pub fn negative(self) -> StatusKey {
        StatusKey {
            status: self,
            negated: true,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or(())
    }
}

/// A status with its polarity.
///
/// Ordering is catalogue order with each positive immediately followed by its
/// negative, which is exactly the derived `(status, negated)` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusKey {
    pub status: Status,
    pub negated: bool,
}

impl StatusKey {
    pub fn is_positive(&self) -> bool {
        !self.negated
    }

    /// The other half of the positive/negative pair
    pub fn complement(&self) -> StatusKey {
        StatusKey {
            status: self.status,
            negated: !self.negated,
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.negated {
            write!(f, "non-{}", self.status)
        } else {
            write!(f, "{}", self.status)
        }
    }
}

impl FromStr for StatusKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("non-") {
            Some(rest) => rest.parse::<Status>().map(Status::negative),
            None => s.parse::<Status>().map(Status::positive),
        }
    }
}

impl Serialize for StatusKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ordered status keys active for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOrder {
    keys: Vec<StatusKey>,
}

impl KeyOrder {
    /// Build the catalogue order, dropping every `pr-*` and `ci-*` key when
    /// pull-request gathering is disabled
    pub fn new(include_pull_requests: bool) -> Self {
        let keys = Status::ALL
            .iter()
            .filter(|status| include_pull_requests || !(status.is_pr() || status.is_ci()))
            .flat_map(|status| [status.positive(), status.negative()])
            .collect();
        Self { keys }
    }

    pub fn keys(&self) -> &[StatusKey] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = StatusKey> + '_ {
        self.keys.iter().copied()
    }

    pub fn positives(&self) -> impl Iterator<Item = Status> + '_ {
        self.keys
            .iter()
            .filter(|key| key.is_positive())
            .map(|key| key.status)
    }

    pub fn contains(&self, key: StatusKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Which branches hold which statuses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusMatrix {
    entries: BTreeMap<StatusKey, BTreeSet<String>>,
}

impl StatusMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty membership set for every key of `order`, so that structured
    /// output lists keys nobody holds as well
    pub fn with_keys(order: &KeyOrder) -> Self {
        Self {
            entries: order.iter().map(|key| (key, BTreeSet::new())).collect(),
        }
    }

    pub fn insert(&mut self, key: StatusKey, branch: &str) {
        self.entries
            .entry(key)
            .or_default()
            .insert(branch.to_string());
    }

    pub fn set(&mut self, status: Status, branch: &str) {
        self.insert(status.positive(), branch);
    }

    pub fn remove(&mut self, key: StatusKey, branch: &str) -> bool {
        self.entries
            .get_mut(&key)
            .is_some_and(|members| members.remove(branch))
    }

    pub fn holds(&self, key: StatusKey, branch: &str) -> bool {
        self.entries
            .get(&key)
            .is_some_and(|members| members.contains(branch))
    }

    pub fn has(&self, status: Status, branch: &str) -> bool {
        self.holds(status.positive(), branch)
    }

    pub fn members(&self, key: StatusKey) -> impl Iterator<Item = &str> {
        self.entries
            .get(&key)
            .into_iter()
            .flat_map(|members| members.iter().map(String::as_str))
    }

    pub fn members_mut(&mut self, key: StatusKey) -> Option<&mut BTreeSet<String>> {
        self.entries.get_mut(&key)
    }

    /// Keys held by `branch`, in catalogue order
    pub fn keys_for<'a>(&'a self, branch: &'a str) -> impl Iterator<Item = StatusKey> + 'a {
        self.entries
            .iter()
            .filter(move |(_, members)| members.contains(branch))
            .map(|(key, _)| *key)
    }
}
