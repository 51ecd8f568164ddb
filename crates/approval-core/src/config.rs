//! Session configuration and label-string parsing

use crate::error::{GateError, Result};
use std::time::Duration;

/// Configuration for one approval session
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Full name of the repository whose workflow is waiting, e.g. "owner/repo"
    pub repo_full_name: String,
    /// Owner of the repository the tracking issue is created in
    pub target_owner: String,
    /// Name of the repository the tracking issue is created in
    pub target_repo: String,
    /// Workflow run identifier, used in the default issue title and body
    pub run_id: u64,
    /// Approver logins, order preserved for display
    pub approvers: Vec<String>,
    /// Number of approvals required; 0 means every approver must approve
    pub minimum_approvals: usize,
    pub issue_title: String,
    pub issue_body: String,
    /// Labels applied to the tracking issue; may be empty
    pub labels: Vec<String>,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl GateConfig {
    /// Validate the configuration
    ///
    /// Configuration errors are fatal and surface before any issue is
    /// created.
    pub fn validate(&self) -> Result<()> {
        if self.approvers.is_empty() {
            return Err(GateError::Config(
                "at least one approver is required".to_string(),
            ));
        }

        if self.minimum_approvals > self.approvers.len() {
            return Err(GateError::Config(format!(
                "minimum approvals ({}) exceeds the number of approvers ({})",
                self.minimum_approvals,
                self.approvers.len()
            )));
        }

        if self.poll_interval.is_zero() {
            return Err(GateError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(GateError::Config(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a comma-separated label string into an ordered list
///
/// Entries are trimmed; empty and whitespace-only entries are dropped.
pub fn parse_labels(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// De-duplicate approver logins case-insensitively, keeping the first
/// occurrence and its original casing for display
pub fn dedupe_approvers(approvers: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut result = Vec::new();

    for approver in approvers {
        let canonical = approver.to_lowercase();
        if !seen.contains(&canonical) {
            seen.push(canonical);
            result.push(approver);
        }
    }

    result
}

/// Default title for the tracking issue
pub fn default_issue_title(run_id: u64) -> String {
    format!("Manual approval required for workflow run {}", run_id)
}

/// Default body for the tracking issue
pub fn default_issue_body(repo_full_name: &str, run_id: u64, approvers: &[String]) -> String {
    let mentions: Vec<String> = approvers.iter().map(|a| format!("@{}", a)).collect();

    format!(
        "Workflow is pending manual review.\n\
        URL: https://github.com/{}/actions/runs/{}\n\n\
        Required approvers: [{}]\n\n\
        Respond \"approved\", \"approve\", \"lgtm\" or \"yes\" to continue the workflow,\n\
        or \"denied\", \"deny\" or \"no\" to cancel it.",
        repo_full_name,
        run_id,
        mentions.join(", ")
    )
}
