//! Quorum evaluation over the ordered comment stream
//!
//! Evaluation is a pure function of the comment snapshot, the approver set
//! and the minimum-approvals threshold: re-running it on the same snapshot
//! always yields the same status.

use crate::matcher::{Decision, Vocabulary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Overall approval status derived from the comments seen so far
///
/// `Pending` is the only non-terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Denied,
}

impl ApprovalStatus {
    /// Stable string token used in outputs and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single issue comment in chronological order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub body: String,
}

impl Comment {
    pub fn new(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
        }
    }
}

/// Derive the overall approval status from an ordered comment snapshot
///
/// For each approver the most recent comment wins; approvers without
/// comments are neutral. A single denial from any approver denies the run
/// regardless of the threshold. Otherwise the approval count is compared
/// against `minimum_approvals`, where 0 means every approver must approve.
///
/// Approver logins are compared case-insensitively and comments from
/// non-approvers are ignored.
pub fn evaluate(
    comments: &[Comment],
    approvers: &[String],
    minimum_approvals: usize,
    vocabulary: &Vocabulary,
) -> ApprovalStatus {
    let canonical: Vec<String> = approvers.iter().map(|a| a.to_lowercase()).collect();

    let mut latest: HashMap<&str, Decision> = HashMap::new();
    for comment in comments {
        let author = comment.author.to_lowercase();
        let Some(approver) = canonical.iter().find(|a| **a == author) else {
            continue;
        };

        // Last comment in sequence wins for this approver
        latest.insert(approver.as_str(), vocabulary.classify(&comment.body));
    }

    if latest.values().any(|d| *d == Decision::Deny) {
        return ApprovalStatus::Denied;
    }

    let approvals = latest
        .values()
        .filter(|d| **d == Decision::Approve)
        .count();

    let threshold = if minimum_approvals > 0 {
        minimum_approvals
    } else {
        canonical.len()
    };

    // An empty approver set is a configuration error upstream; never treat
    // it as trivially approved here.
    if threshold > 0 && approvals >= threshold {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Pending
    }
}
