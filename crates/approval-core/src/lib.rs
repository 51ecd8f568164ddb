//! Approval Gate Core Library
//!
//! Business logic for a manual-approval gate in an automated workflow:
//! keyword classification of issue comments, multi-approver quorum
//! evaluation, the polling session state machine and terminal-state
//! reporting, all against an abstract issue-tracker capability.

pub mod config;
pub mod error;
pub mod matcher;
pub mod quorum;
pub mod report;
pub mod session;
pub mod tracker;

// Re-export main types for easy access
pub use config::{dedupe_approvers, parse_labels, GateConfig};
pub use error::{GateError, Result};
pub use matcher::{Decision, Vocabulary};
pub use quorum::{evaluate, ApprovalStatus, Comment};
pub use report::{GateOutcome, Reporter};
pub use session::{ApprovalSession, SessionOutcome, SessionState};
pub use tracker::{ApprovalIssue, GithubTracker, IssueTracker, NewIssue};
