//! Status aggregation.
//!
//! Turns raw facts into positive statuses only. Negatives are derived later
//! by [`crate::core::deduce`], exclusions applied by [`crate::core::ignore`].
//!
//! # Sources
//! - **Timing/tracking**: `checked-out`, `remote-tracking`, one upstream relation
//! - **Merge membership**: `merged`, never for the current branch
//! - **Remote listing**: `remote-associated`, by branch name only
//! - **Pull requests**: `pr-*` statuses and URLs, through a [`ReviewTool`]
//! - **CI**: one `ci-*` status for branches with an open or draft PR

use crate::core::error::Result;
use crate::core::facts::{CiState, LocalFacts, PrRecord, ReviewState};
use crate::core::github::ReviewTool;
use crate::core::state::{Branch, BranchReport, PrCache};
use crate::core::status::{KeyOrder, Status};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::io::IsTerminal;

/// More queried branches than this get a progress bar
const PROGRESS_THRESHOLD: usize = 5;

/// Build the report from local repository facts
pub fn collect_local(order: &KeyOrder, facts: &LocalFacts) -> BranchReport {
    let mut report = BranchReport::new(order);

    for record in &facts.timing {
        report.branches.insert(
            record.name.clone(),
            Branch::new(&record.name, record.commit_timestamp),
        );

        if record.worktree.is_some() {
            report.matrix.set(Status::CheckedOut, &record.name);
        }
        if record.tracking {
            report.matrix.set(Status::RemoteTracking, &record.name);
            if let Some(relation) = record.relation {
                report.matrix.set(relation.status(), &record.name);
            }
        }
    }

    for event in &facts.checkouts {
        if let Some(branch) = report.branches.get_mut(&event.branch) {
            branch.record_checkout(event.timestamp);
        }
    }

    for name in &facts.merged {
        if facts.current.as_deref() == Some(name.as_str()) {
            continue;
        }
        if report.branches.contains_key(name) {
            report.matrix.set(Status::Merged, name);
        }
    }

    let remote_names: BTreeSet<&str> = facts
        .remotes
        .values()
        .flatten()
        .map(String::as_str)
        .collect();
    for name in report.names() {
        if remote_names.contains(name.as_str()) {
            report.matrix.set(Status::RemoteAssociated, &name);
        }
    }

    log::debug!(
        "Collected {} local branches ({} merged, {} on a remote)",
        report.branches.len(),
        report.matrix.members(Status::Merged.positive()).count(),
        report.matrix.members(Status::RemoteAssociated.positive()).count()
    );
    report
}

/// Add pull-request and CI statuses, consulting and then refreshing the
/// merged pull-request cache.
///
/// Branches whose lookup fails are left without any PR status. When lookups
/// were issued and none of them succeeded, the review tool's environment is
/// checked and a broken tool aborts the run.
pub fn collect_pull_requests(
    report: &mut BranchReport,
    tool: &dyn ReviewTool,
    cache: &mut PrCache,
) -> Result<()> {
    let names = report.names();
    let progress = progress_bar(names.len());

    let mut attempted = 0usize;
    let mut succeeded = 0usize;
    for name in &names {
        progress.set_message(name.clone());
        progress.inc(1);

        if let Some(url) = cache.merged_url(name) {
            log::debug!("Using cached merged pull request for '{name}'");
            report.matrix.set(Status::PrAssociated, name);
            report.matrix.set(Status::PrMerged, name);
            if !url.is_empty() {
                report.urls.insert(name.clone(), url.to_string());
            }
            continue;
        }

        attempted += 1;
        let Some(text) = tool.view_pull_request(name) else {
            continue;
        };
        succeeded += 1;
        apply_pull_request(report, name, &PrRecord::parse(&text));
    }

    if attempted > 0 && succeeded == 0 {
        tool.check_environment()?;
        log::debug!("No pull requests found for {attempted} branches");
    }

    let with_checks: Vec<String> = names
        .iter()
        .filter(|name| {
            report.matrix.has(Status::PrOpen, name) || report.matrix.has(Status::PrDraft, name)
        })
        .cloned()
        .collect();
    for name in &with_checks {
        progress.set_message(format!("checks: {name}"));
        let state = tool
            .pull_request_checks(name)
            .map(|rows| CiState::parse(&rows))
            .unwrap_or(CiState::Pending);
        report.matrix.set(state.status(), name);
    }
    progress.finish_and_clear();

    cache.replace(
        report
            .matrix
            .members(Status::PrMerged.positive())
            .map(|name| {
                let url = report.urls.get(name).cloned().unwrap_or_default();
                (name.to_string(), url)
            })
            .collect::<Vec<_>>(),
    );
    Ok(())
}

fn apply_pull_request(report: &mut BranchReport, name: &str, record: &PrRecord) {
    let matrix = &mut report.matrix;
    matrix.set(Status::PrAssociated, name);
    if let Some(state) = record.state {
        matrix.set(state.status(), name);
    }
    if !record.reviewers.is_empty() {
        matrix.set(Status::PrReviewAssigned, name);
    }
    if record.any_reviewer(ReviewState::Commented) {
        matrix.set(Status::PrReviewCommented, name);
    }
    if record.any_reviewer(ReviewState::ChangesRequested) {
        matrix.set(Status::PrReviewChangesRequested, name);
    }
    if record.all_approved() {
        matrix.set(Status::PrReviewApproved, name);
    }
    if let Some(url) = &record.url {
        report.urls.insert(name.to_string(), url.clone());
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    if len <= PROGRESS_THRESHOLD || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}") {
        bar.set_style(style);
    }
    bar
}
