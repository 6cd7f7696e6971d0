//! git-brief - a one-line-per-branch status report for Git repositories.
//!
//! Every local branch is listed with the time it was last committed to or
//! checked out, decorated with indicators for its merge state, upstream
//! relation, pull request, reviews and CI.
//!
//! # Public API
//! The main public interface is re-exported from the [`core`] module, which provides:
//! - Git repository facts and configuration
//! - Status aggregation, deduction and ignore filtering
//! - Indicator styling and report rendering
//! - Error handling and result types

pub mod commands;
pub mod core;

// Re-export the core public API for external users
pub use core::{
    // Error handling
    BriefError,
    // Git operations
    GitRepo,
    // Status model
    KeyOrder,
    Result,
    Status,
    StatusKey,
    StatusMatrix,
    // Report and rendering
    BranchReport,
    IndicatorTable,
    RenderOptions,
    Settings,
};
