//! Pull-request and CI lookups through the GitHub CLI.
//!
//! [`ReviewTool`] is the seam the aggregator talks to; [`GhCli`] implements
//! it by running `gh` in the repository's working directory. Per-branch
//! lookups never fail the run: a lookup that errors simply yields `None`.
//! Whether `gh` is usable at all is decided by one lazy, memoized
//! environment check, run only when no lookup succeeded.

use crate::core::error::{BriefError, Result};
use semver::Version;
use std::cell::OnceCell;
use std::path::PathBuf;
use std::process::{Command, Output};

pub const MIN_GH_VERSION: &str = "2.0.0";

/// Source of raw pull-request and CI records
pub trait ReviewTool {
    /// Free-text pull-request record for `branch`, `None` when the lookup
    /// failed or no pull request exists
    fn view_pull_request(&self, branch: &str) -> Option<String>;

    /// Tab-delimited check rows for `branch`, `None` when unavailable
    fn pull_request_checks(&self, branch: &str) -> Option<String>;

    /// Fail with a diagnostic when the tool cannot be used at all
    fn check_environment(&self) -> Result<()>;
}

pub struct GhCli {
    workdir: PathBuf,
    environment: OnceCell<std::result::Result<(), String>>,
}

impl GhCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            environment: OnceCell::new(),
        }
    }

    fn run(&self, args: &[&str]) -> std::io::Result<Output> {
        log::debug!("Running gh {}", args.join(" "));
        Command::new("gh")
            .args(args)
            .current_dir(&self.workdir)
            .env("GH_PROMPT_DISABLED", "1")
            .env("NO_COLOR", "1")
            .env_remove("GH_FORCE_TTY")
            .output()
    }

    fn probe(&self) -> std::result::Result<(), String> {
        let output = self
            .run(&["--version"])
            .map_err(|e| format!("gh is not installed or not on PATH ({e})"))?;
        let text = String::from_utf8_lossy(&output.stdout);
        let version = parse_gh_version(&text)
            .ok_or_else(|| format!("could not determine gh version from '{}'", text.trim()))?;
        let minimum = Version::parse(MIN_GH_VERSION).map_err(|e| e.to_string())?;
        if version < minimum {
            return Err(format!(
                "gh {version} is older than the required {minimum}"
            ));
        }

        let auth = self
            .run(&["auth", "status"])
            .map_err(|e| format!("could not run 'gh auth status' ({e})"))?;
        if !auth.status.success() {
            return Err("gh is not authenticated, run 'gh auth login'".to_string());
        }

        let repo = self
            .run(&["repo", "view", "--json", "url"])
            .map_err(|e| format!("could not run 'gh repo view' ({e})"))?;
        if !repo.status.success() {
            return Err(format!(
                "repository is not reachable through gh: {}",
                String::from_utf8_lossy(&repo.stderr).trim()
            ));
        }

        Ok(())
    }
}

impl ReviewTool for GhCli {
    fn view_pull_request(&self, branch: &str) -> Option<String> {
        match self.run(&["pr", "view", branch]) {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                log::debug!(
                    "No pull request for '{branch}': {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                log::debug!("gh pr view failed for '{branch}': {e}");
                None
            }
        }
    }

    fn pull_request_checks(&self, branch: &str) -> Option<String> {
        // Pending and failing checks exit non-zero, so only the rows matter
        match self.run(&["pr", "checks", branch]) {
            Ok(output) => {
                let rows = String::from_utf8_lossy(&output.stdout).into_owned();
                (!rows.trim().is_empty()).then_some(rows)
            }
            Err(e) => {
                log::debug!("gh pr checks failed for '{branch}': {e}");
                None
            }
        }
    }

    fn check_environment(&self) -> Result<()> {
        self.environment
            .get_or_init(|| self.probe())
            .clone()
            .map_err(BriefError::review_tool_unavailable)
    }
}

/// Extract the version from `gh --version` output
pub fn parse_gh_version(text: &str) -> Option<Version> {
    text.lines()
        .find_map(|line| line.trim().strip_prefix("gh version "))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|version| Version::parse(version).ok())
}
