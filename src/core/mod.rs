//! Core functionality for the git-brief tool.
//!
//! This module provides the building blocks of the branch report: fact
//! gathering from git and the review tool, status aggregation, deduction and
//! filtering, indicator styling and rendering.

pub mod aggregate;
pub mod colors;
pub mod config;
pub mod deduce;
pub mod dirs;
pub mod error;
pub mod facts;
pub mod git;
pub mod github;
pub mod ignore;
pub mod indicators;
pub mod output;
pub mod render;
pub mod state;
pub mod status;

// === Error handling ===
// Core error types and result type used throughout the application
pub use error::{BriefError, Result};

// === Git operations ===
// Repository access for branch facts and `brief.*` configuration
pub use git::{open_repository, GitRepo};

// === Status catalogue ===
// Ordered status keys and the branch-by-key membership matrix
pub use status::{KeyOrder, Status, StatusKey, StatusMatrix};

// === Pipeline stages ===
// Aggregation, negative deduction and ignore filtering
pub use aggregate::{collect_local, collect_pull_requests};
pub use deduce::deduce_inverted;
pub use ignore::{IgnoreFilter, IgnoreRules, IgnoreScope};

// === State management ===
// Per-run report and the persisted merged pull request cache
pub use state::{Branch, BranchReport, PrCache};

// === Styling and rendering ===
pub use config::{Settings, Toggle};
pub use indicators::{IndicatorOverride, IndicatorTable};
pub use render::{render_json, render_text, RenderOptions};

// === Output formatting ===
pub use output::{print_error, Output};
