//! Approval session state machine
//!
//! Owns the lifecycle of one manual-approval gate: open the tracking issue,
//! poll its comments on a fixed interval and stop on the first terminal
//! state. The polling loop is a single cooperative task that races the
//! interval tick against the overall deadline and an external cancellation
//! signal; cancellation is only observed at these suspension points, never
//! mid-request.

use crate::config::GateConfig;
use crate::error::Result;
use crate::matcher::Vocabulary;
use crate::quorum::{evaluate, ApprovalStatus};
use crate::report;
use crate::tracker::{ApprovalIssue, IssueTracker, NewIssue};
use tokio::sync::watch;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};

/// Lifecycle state of an approval session
///
/// `Created → Polling → {Approved, Denied, TimedOut, Cancelled}`; the four
/// right-hand states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Polling,
    Approved,
    Denied,
    TimedOut,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Approved | Self::Denied | Self::TimedOut | Self::Cancelled
        )
    }
}

/// Result of a completed session run
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub state: SessionState,
    pub issue: ApprovalIssue,
}

/// One manual-approval gate against a single tracking issue
pub struct ApprovalSession<T: IssueTracker> {
    config: GateConfig,
    vocabulary: Vocabulary,
    tracker: T,
    state: SessionState,
}

impl<T: IssueTracker> ApprovalSession<T> {
    pub fn new(config: GateConfig, vocabulary: Vocabulary, tracker: T) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            vocabulary,
            tracker,
            state: SessionState::Created,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to a terminal state
    ///
    /// Creates the tracking issue, then polls comments until the quorum
    /// evaluator reports a terminal status, the timeout elapses or `cancel`
    /// flips to true. Issue-creation failures are fatal; comment-fetch
    /// failures during polling are logged and retried on the next tick.
    /// Terminal side effects (the closing comment) happen exactly once.
    pub async fn run(&mut self, mut cancel: watch::Receiver<bool>) -> Result<SessionOutcome> {
        let issue = self.create_tracking_issue().await?;
        self.state = SessionState::Polling;
        log::info!(
            "Created approval issue #{} for run {}: {}",
            issue.number,
            self.config.run_id,
            issue.html_url
        );

        let deadline = Instant::now() + self.config.timeout;
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cancel_closed = false;

        let terminal = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(state) = self.poll_once(&issue).await {
                        break state;
                    }
                }
                _ = sleep_until(deadline) => {
                    log::warn!(
                        "No decision on issue #{} within {:?}, timing out",
                        issue.number,
                        self.config.timeout
                    );
                    break SessionState::TimedOut;
                }
                changed = cancel.changed(), if !cancel_closed => {
                    match changed {
                        Ok(()) if *cancel.borrow() => {
                            log::warn!(
                                "Cancellation requested, stopping approval session for issue #{}",
                                issue.number
                            );
                            break SessionState::Cancelled;
                        }
                        Ok(()) => {}
                        // Sender dropped: cancellation can no longer arrive
                        Err(_) => cancel_closed = true,
                    }
                }
            }
        };

        self.state = terminal;
        self.post_closing_comment(&issue, terminal).await;

        Ok(SessionOutcome {
            state: terminal,
            issue,
        })
    }

    async fn create_tracking_issue(&self) -> Result<ApprovalIssue> {
        let labels = if self.config.labels.is_empty() {
            None
        } else {
            Some(self.config.labels.clone())
        };

        let request = NewIssue {
            title: self.config.issue_title.clone(),
            body: self.config.issue_body.clone(),
            labels,
        };

        self.tracker.create_issue(&request).await
    }

    /// One polling tick: fetch comments and evaluate the quorum
    ///
    /// Returns the terminal state when one is reached, `None` to keep
    /// polling.
    async fn poll_once(&self, issue: &ApprovalIssue) -> Option<SessionState> {
        let comments = match self.tracker.list_comments(issue.number).await {
            Ok(comments) => comments,
            Err(e) => {
                log::warn!(
                    "Failed to fetch comments for issue #{}: {} (retrying on next tick)",
                    issue.number,
                    e
                );
                return None;
            }
        };

        let status = evaluate(
            &comments,
            &self.config.approvers,
            self.config.minimum_approvals,
            &self.vocabulary,
        );
        log::debug!(
            "Evaluated {} comments on issue #{}: {}",
            comments.len(),
            issue.number,
            status
        );

        match status {
            ApprovalStatus::Approved => Some(SessionState::Approved),
            ApprovalStatus::Denied => Some(SessionState::Denied),
            ApprovalStatus::Pending => {
                log::info!("Approval still pending on issue #{}", issue.number);
                None
            }
        }
    }

    async fn post_closing_comment(&self, issue: &ApprovalIssue, state: SessionState) {
        let body = report::closing_comment(state);

        // A failed closing comment must not change the already-reached
        // terminal state.
        if let Err(e) = self.tracker.post_comment(issue.number, &body).await {
            log::error!(
                "Failed to post closing comment on issue #{}: {}",
                issue.number,
                e
            );
        }
    }
}
