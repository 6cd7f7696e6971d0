//! Domain-specific error types and error handling utilities.
//!
//! This module defines [`BriefError`] which covers every fatal condition a
//! git-brief run can hit. It uses `thiserror` for ergonomic error definitions
//! and includes constructors for the variants that carry context.
//!
//! # Public API
//! - [`BriefError`]: Main error enum covering all failure modes
//! - [`Result<T>`]: Type alias for `std::result::Result<T, BriefError>`
//!
//! # Error Categories
//! - **Configuration**: malformed style values, option values and date formats
//! - **Repository**: not inside a repository, git2 library errors
//! - **Review tool**: missing, outdated or unauthenticated `gh`
//! - **Output**: I/O, JSON serialization, pager startup

use std::path::PathBuf;
use thiserror::Error;

/// Domain-specific error types for git-brief
#[derive(Error, Debug)]
pub enum BriefError {
    // Git repository errors
    #[error("Not in a git repository")]
    NotInGitRepo,

    #[error("Git repository error: {0}")]
    GitRepo(#[from] git2::Error),

    // Configuration errors
    #[error("Invalid style value for '{key}': '{value}'")]
    InvalidStyleValue { key: String, value: String },

    #[error("Invalid value for '{key}': '{value}'")]
    InvalidOptionValue { key: String, value: String },

    #[error("Invalid date format '{format}'")]
    InvalidDateFormat { format: String },

    // Review tool errors
    #[error("GitHub CLI is unusable: {reason}")]
    ReviewToolUnavailable { reason: String },

    // Output errors
    #[error("Failed to start pager '{command}': {source}")]
    PagerFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Cache errors
    #[error("Failed to write cache file '{path}': {source}")]
    CacheWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using BriefError
pub type Result<T> = std::result::Result<T, BriefError>;

impl BriefError {
    /// Create an invalid style value error for a configuration key
    pub fn invalid_style_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidStyleValue {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create an invalid option value error for a configuration key or flag
    pub fn invalid_option_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidOptionValue {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn invalid_date_format(format: impl Into<String>) -> Self {
        Self::InvalidDateFormat {
            format: format.into(),
        }
    }

    pub fn review_tool_unavailable(reason: impl Into<String>) -> Self {
        Self::ReviewToolUnavailable {
            reason: reason.into(),
        }
    }

    pub fn pager_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::PagerFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a cache write failed error
    pub fn cache_write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheWriteFailed {
            path: path.into(),
            source,
        }
    }
}
