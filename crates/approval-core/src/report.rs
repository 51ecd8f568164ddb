//! Terminal-state reporting: closing comments and structured outputs

use crate::error::{GateError, Result};
use crate::session::SessionState;
use crate::tracker::ApprovalIssue;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Structured record of a finished approval session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub status: &'static str,
    pub issue_number: u64,
    pub issue_url: String,
}

/// Stable string token for a session state
pub fn status_token(state: SessionState) -> &'static str {
    match state {
        SessionState::Created | SessionState::Polling => "pending",
        SessionState::Approved => "approved",
        SessionState::Denied => "denied",
        SessionState::TimedOut => "timed_out",
        SessionState::Cancelled => "cancelled",
    }
}

/// Body of the comment posted on the tracking issue once the session
/// reaches a terminal state
pub fn closing_comment(state: SessionState) -> String {
    let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

    match state {
        SessionState::Approved => {
            format!("✅ Approval received, continuing the workflow run ({})", now)
        }
        SessionState::Denied => {
            format!("❌ Approval denied, cancelling the workflow run ({})", now)
        }
        SessionState::TimedOut => format!(
            "⏰ No decision was reached within the configured timeout, cancelling the workflow run ({})",
            now
        ),
        SessionState::Cancelled => format!(
            "🛑 The workflow run was cancelled before a decision was reached ({})",
            now
        ),
        SessionState::Created | SessionState::Polling => {
            format!("Approval is still pending ({})", now)
        }
    }
}

/// Writes the session outcome to the configured structured-output sink
pub struct Reporter {
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    /// Translate a terminal state and issue into the structured outcome
    pub fn report(&self, state: SessionState, issue: &ApprovalIssue) -> GateOutcome {
        GateOutcome {
            status: status_token(state),
            issue_number: issue.number,
            issue_url: issue.html_url.clone(),
        }
    }

    /// Write the outcome as key/value pairs to the output sink
    ///
    /// Returns `Ok(false)` when no sink is configured; that is an expected
    /// "skipped" condition, not a failure. The sink file is recreated on
    /// every write, never appended to, so re-invocations produce a single
    /// clean result.
    pub fn write_outputs(&self, outcome: &GateOutcome) -> Result<bool> {
        let path = match &self.output_path {
            Some(path) => path,
            None => {
                log::info!("No output file configured, skipping structured outputs");
                return Ok(false);
            }
        };

        let mut file = fs::File::create(path).map_err(|e| {
            GateError::Output(format!(
                "failed to create output file {}: {}",
                path.display(),
                e
            ))
        })?;

        writeln!(file, "approval_status={}", outcome.status)
            .and_then(|_| writeln!(file, "issue_number={}", outcome.issue_number))
            .and_then(|_| writeln!(file, "issue_url={}", outcome.issue_url))
            .map_err(|e| {
                GateError::Output(format!(
                    "failed to write output file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        log::info!("Wrote approval outputs to {}", path.display());
        Ok(true)
    }
}
