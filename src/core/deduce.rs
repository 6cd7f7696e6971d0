//! Inverted-status deduction.
//!
//! For every branch and every positive status of the active order, exactly
//! one of `X` / `non-X` holds afterwards, unless the pair does not apply to
//! the branch, in which case neither does:
//!
//! - `pr-*` (other than `pr-associated`) needs `pr-associated`
//! - `remote-*` (other than `remote-tracking` and `remote-associated`) needs
//!   `remote-tracking`
//! - `pr-review-*` is void once the PR is closed or merged, or the branch
//!   itself is merged
//! - `ci-*` needs CI to have been evaluated, i.e. an open or draft PR

use crate::core::status::{KeyOrder, Status, StatusMatrix};

/// Whether the `status` / `non-status` pair means anything for `branch`
pub fn is_applicable(status: Status, matrix: &StatusMatrix, branch: &str) -> bool {
    if status.is_pr() && status != Status::PrAssociated && !matrix.has(Status::PrAssociated, branch)
    {
        return false;
    }
    if status.is_remote()
        && !matches!(status, Status::RemoteTracking | Status::RemoteAssociated)
        && !matrix.has(Status::RemoteTracking, branch)
    {
        return false;
    }
    if status.is_review()
        && (matrix.has(Status::PrClosed, branch)
            || matrix.has(Status::PrMerged, branch)
            || matrix.has(Status::Merged, branch))
    {
        return false;
    }
    if status.is_ci() && !(matrix.has(Status::PrOpen, branch) || matrix.has(Status::PrDraft, branch))
    {
        return false;
    }
    true
}

/// Fill in negative statuses for `branches`. Positives of pairs that do not
/// apply to a branch are dropped as well.
pub fn deduce_inverted<'a, I>(matrix: &mut StatusMatrix, order: &KeyOrder, branches: I)
where
    I: IntoIterator<Item = &'a str>,
{
    for branch in branches {
        // Decide against the aggregated state, then mutate
        let decisions: Vec<(Status, bool)> = order
            .positives()
            .filter(|status| order.contains(status.negative()))
            .map(|status| (status, is_applicable(status, matrix, branch)))
            .collect();

        for (status, applicable) in decisions {
            if !applicable {
                if matrix.remove(status.positive(), branch) {
                    log::debug!("Dropped inapplicable '{status}' from '{branch}'");
                }
                continue;
            }
            if !matrix.has(status, branch) {
                matrix.insert(status.negative(), branch);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::StatusKey;

    fn deduce(matrix: &mut StatusMatrix, order: &KeyOrder, branches: &[&str]) {
        deduce_inverted(matrix, order, branches.iter().copied());
    }

    fn exactly_one_or_neither(matrix: &StatusMatrix, order: &KeyOrder, branch: &str) {
        for status in order.positives() {
            let positive = matrix.has(status, branch);
            let negative = matrix.holds(status.negative(), branch);
            if is_applicable(status, matrix, branch) {
                assert!(positive ^ negative, "{branch}: {status} must be decided");
            } else {
                assert!(!positive && !negative, "{branch}: {status} must be void");
            }
        }
    }

    #[test]
    fn test_plain_local_branch() {
        let order = KeyOrder::new(true);
        let mut matrix = StatusMatrix::with_keys(&order);
        deduce(&mut matrix, &order, &["feature"]);

        let held: Vec<String> = matrix.keys_for("feature").map(|k| k.to_string()).collect();
        assert_eq!(
            held,
            [
                "non-checked-out",
                "non-merged",
                "non-remote-tracking",
                "non-remote-associated",
                "non-pr-associated",
            ]
        );
        exactly_one_or_neither(&matrix, &order, "feature");
    }

    #[test]
    fn test_tracking_branch_gets_remote_negatives() {
        let order = KeyOrder::new(false);
        let mut matrix = StatusMatrix::with_keys(&order);
        matrix.set(Status::RemoteTracking, "main");
        matrix.set(Status::RemoteSynced, "main");
        deduce(&mut matrix, &order, &["main"]);

        assert!(matrix.holds(Status::RemoteAhead.negative(), "main"));
        assert!(matrix.holds(Status::RemoteBehind.negative(), "main"));
        assert!(matrix.holds(Status::RemoteMixed.negative(), "main"));
        assert!(!matrix.holds(Status::RemoteSynced.negative(), "main"));
        exactly_one_or_neither(&matrix, &order, "main");
    }

    #[test]
    fn test_review_statuses_void_for_closed_or_merged() {
        let order = KeyOrder::new(true);
        let mut matrix = StatusMatrix::with_keys(&order);
        for branch in ["closed", "pr-merged", "merged"] {
            matrix.set(Status::PrAssociated, branch);
            matrix.set(Status::PrReviewAssigned, branch);
            matrix.set(Status::PrReviewApproved, branch);
        }
        matrix.set(Status::PrClosed, "closed");
        matrix.set(Status::PrMerged, "pr-merged");
        matrix.set(Status::PrOpen, "merged");
        matrix.set(Status::Merged, "merged");

        deduce(&mut matrix, &order, &["closed", "pr-merged", "merged"]);

        for branch in ["closed", "pr-merged", "merged"] {
            for status in Status::ALL.iter().filter(|s| s.is_review()) {
                assert!(!matrix.has(*status, branch), "{branch} {status}");
                assert!(!matrix.holds(status.negative(), branch), "{branch} non-{status}");
            }
            exactly_one_or_neither(&matrix, &order, branch);
        }
        // the merged branch still has an open PR, so CI was evaluated
        assert!(matrix.holds(Status::CiPass.negative(), "merged"));
        assert!(!matrix.holds(Status::CiPass.negative(), "closed"));
    }

    #[test]
    fn test_open_pr_gets_review_and_ci_negatives() {
        let order = KeyOrder::new(true);
        let mut matrix = StatusMatrix::with_keys(&order);
        matrix.set(Status::PrAssociated, "feature");
        matrix.set(Status::PrOpen, "feature");
        matrix.set(Status::CiFail, "feature");
        deduce(&mut matrix, &order, &["feature"]);

        assert!(matrix.holds(Status::PrReviewApproved.negative(), "feature"));
        assert!(matrix.holds(Status::PrDraft.negative(), "feature"));
        assert!(matrix.holds(Status::CiPass.negative(), "feature"));
        assert!(matrix.holds(Status::CiPending.negative(), "feature"));
        assert!(!matrix.holds(Status::CiFail.negative(), "feature"));
        exactly_one_or_neither(&matrix, &order, "feature");
    }

    #[test]
    fn test_pruned_order_never_produces_pr_keys() {
        let order = KeyOrder::new(false);
        let mut matrix = StatusMatrix::with_keys(&order);
        deduce(&mut matrix, &order, &["feature"]);
        assert!(matrix
            .keys_for("feature")
            .all(|key: StatusKey| !key.status.is_pr() && !key.status.is_ci()));
    }
}
