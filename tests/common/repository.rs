//! Git repository management and setup utilities
//!
//! Repositories are created under a throwaway directory that also serves as
//! `HOME` and cache root, so user configuration never leaks into a test.

#![allow(dead_code)]

use assert_cmd::prelude::*;
use git_brief::core::error::{BriefError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const FIXED_DATE: &str = "1700000000 +0000";

/// Test repository setup result containing both the temporary directory
/// and the repository path. The TempDir must be kept alive for the duration
/// of the test to prevent cleanup.
pub struct TestRepo {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestRepo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Isolated home directory next to the repository
    pub fn home(&self) -> PathBuf {
        self.temp_dir.path().join("home")
    }

    /// The git-brief binary, run inside the repository with an isolated
    /// environment
    pub fn brief(&self) -> anyhow::Result<Command> {
        let mut cmd = Command::cargo_bin("git-brief")?;
        isolate(&mut cmd, &self.home());
        cmd.current_dir(&self.path);
        Ok(cmd)
    }
}

fn isolate(cmd: &mut Command, home: &Path) {
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_CACHE_HOME", home.join(".cache"))
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_PAGER", "cat")
        .env_remove("RUST_LOG");
}

/// Runs git with fixed author and committer dates
pub fn git(repo_path: &Path, args: &[&str]) -> Result<()> {
    let home = repo_path.parent().map(|p| p.join("home")).unwrap_or_default();
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .env("HOME", &home)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_AUTHOR_DATE", FIXED_DATE)
        .env("GIT_COMMITTER_DATE", FIXED_DATE)
        .output()
        .map_err(BriefError::Io)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BriefError::Io(std::io::Error::other(format!(
            "git {} failed: {stderr}",
            args.join(" ")
        ))));
    }
    Ok(())
}

/// Sets up a fresh git repository on `main` for testing
pub fn setup_test_repo() -> Result<TestRepo> {
    let temp_dir = TempDir::new().map_err(BriefError::Io)?;
    let repo_path = temp_dir.path().join("repo");
    fs::create_dir_all(&repo_path).map_err(BriefError::Io)?;
    fs::create_dir_all(temp_dir.path().join("home")).map_err(BriefError::Io)?;

    git(&repo_path, &["init", "--quiet"])?;
    git(&repo_path, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
    git(&repo_path, &["config", "user.name", "Test User"])?;
    git(&repo_path, &["config", "user.email", "test@example.com"])?;

    Ok(TestRepo {
        temp_dir,
        path: repo_path,
    })
}

/// Sets up a repository with an initial commit on `main`
pub fn setup_test_repo_with_initial_commit() -> Result<TestRepo> {
    let repo = setup_test_repo()?;
    commit_file(&repo.path, "initial.txt", "initial content\n")?;
    Ok(repo)
}

/// Repository with `main` checked out, `old` merged into it and `feature`
/// one commit ahead of `main`
pub fn setup_branching_repo() -> Result<TestRepo> {
    let repo = setup_test_repo_with_initial_commit()?;
    git(&repo.path, &["branch", "old"])?;
    git(&repo.path, &["checkout", "--quiet", "-b", "feature"])?;
    commit_file(&repo.path, "feature.txt", "feature\n")?;
    git(&repo.path, &["checkout", "--quiet", "main"])?;
    Ok(repo)
}

/// Writes a file and commits it
pub fn commit_file(repo_path: &Path, filename: &str, content: &str) -> Result<()> {
    fs::write(repo_path.join(filename), content).map_err(BriefError::Io)?;
    git(repo_path, &["add", filename])?;
    git(repo_path, &["commit", "--quiet", "-m", filename])
}

/// Sets a repository-local configuration value
pub fn git_config(repo_path: &Path, key: &str, value: &str) -> Result<()> {
    git(repo_path, &["config", "--add", key, value])
}

/// A directory that is not inside any repository
pub fn setup_plain_dir() -> Result<TempDir> {
    TempDir::new().map_err(BriefError::Io)
}

/// The git-brief binary with an isolated environment, run in `dir`
pub fn brief_in(dir: &Path) -> anyhow::Result<Command> {
    let mut cmd = Command::cargo_bin("git-brief")?;
    isolate(&mut cmd, dir);
    cmd.current_dir(dir);
    Ok(cmd)
}
