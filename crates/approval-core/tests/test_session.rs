//! Session state machine tests against a scripted tracker

use approval_core::{
    ApprovalIssue, ApprovalSession, Comment, GateConfig, GateError, IssueTracker, NewIssue,
    Result, SessionState, Vocabulary,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// One scripted response for a `list_comments` call
enum CommentBatch {
    Comments(Vec<Comment>),
    TransientError,
}

/// Hand-rolled tracker double: replays scripted comment batches in order,
/// then keeps returning the last successful batch.
struct ScriptedTracker {
    batches: Mutex<VecDeque<CommentBatch>>,
    last_batch: Mutex<Vec<Comment>>,
    created_issues: Mutex<Vec<NewIssue>>,
    posted_comments: Mutex<Vec<String>>,
    fail_creation: bool,
}

impl ScriptedTracker {
    fn new(batches: Vec<CommentBatch>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            last_batch: Mutex::new(Vec::new()),
            created_issues: Mutex::new(Vec::new()),
            posted_comments: Mutex::new(Vec::new()),
            fail_creation: false,
        }
    }

    fn with_failing_creation() -> Self {
        let mut tracker = Self::new(Vec::new());
        tracker.fail_creation = true;
        tracker
    }

    fn created_issues(&self) -> Vec<NewIssue> {
        self.created_issues.lock().unwrap().clone()
    }

    fn posted_comments(&self) -> Vec<String> {
        self.posted_comments.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueTracker for &ScriptedTracker {
    async fn create_issue(&self, issue: &NewIssue) -> Result<ApprovalIssue> {
        if self.fail_creation {
            return Err(GateError::Tracker("issue creation failed".to_string()));
        }

        self.created_issues.lock().unwrap().push(issue.clone());
        Ok(ApprovalIssue {
            number: 7,
            html_url: "https://github.com/owner/repo/issues/7".to_string(),
        })
    }

    async fn list_comments(&self, _issue_number: u64) -> Result<Vec<Comment>> {
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(CommentBatch::Comments(comments)) => {
                *self.last_batch.lock().unwrap() = comments.clone();
                Ok(comments)
            }
            Some(CommentBatch::TransientError) => {
                Err(GateError::Tracker("comment listing failed".to_string()))
            }
            None => Ok(self.last_batch.lock().unwrap().clone()),
        }
    }

    async fn post_comment(&self, _issue_number: u64, body: &str) -> Result<()> {
        self.posted_comments.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

fn config(approvers: &[&str], minimum_approvals: usize) -> GateConfig {
    GateConfig {
        repo_full_name: "owner/repo".to_string(),
        target_owner: "owner".to_string(),
        target_repo: "repo".to_string(),
        run_id: 12345,
        approvers: approvers.iter().map(|a| a.to_string()).collect(),
        minimum_approvals,
        issue_title: "Test Issue".to_string(),
        issue_body: "Test Body".to_string(),
        labels: Vec::new(),
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_millis(500),
    }
}

fn never_cancelled() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

#[tokio::test(start_paused = true)]
async fn test_session_reaches_approved() {
    let tracker = ScriptedTracker::new(vec![
        CommentBatch::Comments(Vec::new()),
        CommentBatch::Comments(vec![Comment::new("approver1", "Approved")]),
    ]);
    let mut session =
        ApprovalSession::new(config(&["approver1"], 0), Vocabulary::default(), &tracker).unwrap();

    let (_tx, cancel) = never_cancelled();
    let outcome = session.run(cancel).await.unwrap();

    assert_eq!(outcome.state, SessionState::Approved);
    assert_eq!(session.state(), SessionState::Approved);
    assert_eq!(outcome.issue.number, 7);
}

#[tokio::test(start_paused = true)]
async fn test_session_reaches_denied() {
    let tracker = ScriptedTracker::new(vec![CommentBatch::Comments(vec![Comment::new(
        "approver1", "Denied",
    )])]);
    let mut session = ApprovalSession::new(
        config(&["approver1", "approver2"], 2),
        Vocabulary::default(),
        &tracker,
    )
    .unwrap();

    let (_tx, cancel) = never_cancelled();
    let outcome = session.run(cancel).await.unwrap();

    // Denial is a veto regardless of the threshold
    assert_eq!(outcome.state, SessionState::Denied);
}

#[tokio::test(start_paused = true)]
async fn test_session_times_out_without_decision() {
    let tracker = ScriptedTracker::new(vec![CommentBatch::Comments(Vec::new())]);
    let mut session =
        ApprovalSession::new(config(&["approver1"], 0), Vocabulary::default(), &tracker).unwrap();

    let (_tx, cancel) = never_cancelled();
    let outcome = session.run(cancel).await.unwrap();

    assert_eq!(outcome.state, SessionState::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn test_session_observes_cancellation() {
    let tracker = ScriptedTracker::new(vec![CommentBatch::Comments(Vec::new())]);
    let mut session =
        ApprovalSession::new(config(&["approver1"], 0), Vocabulary::default(), &tracker).unwrap();

    let (tx, cancel) = never_cancelled();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(35)).await;
        let _ = tx.send(true);
    });

    let outcome = session.run(cancel).await.unwrap();
    assert_eq!(outcome.state, SessionState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_issue_creation_failure_is_fatal() {
    let tracker = ScriptedTracker::with_failing_creation();
    let mut session =
        ApprovalSession::new(config(&["approver1"], 0), Vocabulary::default(), &tracker).unwrap();

    let (_tx, cancel) = never_cancelled();
    let err = session.run(cancel).await.unwrap_err();

    assert!(err.to_string().contains("issue creation failed"));
    // No closing comment when the issue was never created
    assert!(tracker.posted_comments().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_transient_fetch_failure_is_retried() {
    let tracker = ScriptedTracker::new(vec![
        CommentBatch::TransientError,
        CommentBatch::TransientError,
        CommentBatch::Comments(vec![Comment::new("approver1", "lgtm")]),
    ]);
    let mut session =
        ApprovalSession::new(config(&["approver1"], 0), Vocabulary::default(), &tracker).unwrap();

    let (_tx, cancel) = never_cancelled();
    let outcome = session.run(cancel).await.unwrap();

    assert_eq!(outcome.state, SessionState::Approved);
}

#[tokio::test(start_paused = true)]
async fn test_create_issue_omits_labels_when_empty() {
    let tracker = ScriptedTracker::new(vec![CommentBatch::Comments(vec![Comment::new(
        "approver1", "yes",
    )])]);
    let mut session =
        ApprovalSession::new(config(&["approver1"], 0), Vocabulary::default(), &tracker).unwrap();

    let (_tx, cancel) = never_cancelled();
    session.run(cancel).await.unwrap();

    let created = tracker.created_issues();
    assert_eq!(created.len(), 1);
    assert!(created[0].labels.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_create_issue_carries_configured_labels() {
    let tracker = ScriptedTracker::new(vec![CommentBatch::Comments(vec![Comment::new(
        "approver1", "yes",
    )])]);
    let mut gate_config = config(&["approver1"], 0);
    gate_config.labels = vec!["bug".to_string(), "enhancement".to_string()];
    let mut session = ApprovalSession::new(gate_config, Vocabulary::default(), &tracker).unwrap();

    let (_tx, cancel) = never_cancelled();
    session.run(cancel).await.unwrap();

    let created = tracker.created_issues();
    assert_eq!(created.len(), 1);
    assert_eq!(
        created[0].labels,
        Some(vec!["bug".to_string(), "enhancement".to_string()])
    );
}

#[tokio::test(start_paused = true)]
async fn test_closing_comment_is_posted_exactly_once() {
    let tracker = ScriptedTracker::new(vec![CommentBatch::Comments(vec![Comment::new(
        "approver1", "Approved",
    )])]);
    let mut session =
        ApprovalSession::new(config(&["approver1"], 0), Vocabulary::default(), &tracker).unwrap();

    let (_tx, cancel) = never_cancelled();
    session.run(cancel).await.unwrap();

    let posted = tracker.posted_comments();
    assert_eq!(posted.len(), 1);
    assert!(posted[0].contains("Approval received"));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_config_is_rejected_before_any_tracker_call() {
    let tracker = ScriptedTracker::new(Vec::new());
    let result = ApprovalSession::new(config(&[], 0), Vocabulary::default(), &tracker);

    assert!(matches!(result, Err(GateError::Config(_))));
    assert!(tracker.created_issues().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_session_with_custom_vocabulary() {
    let tracker = ScriptedTracker::new(vec![CommentBatch::Comments(vec![Comment::new(
        "approver1", ":shipit:",
    )])]);
    let vocabulary = Vocabulary::default().with_approval_word(":shipit:");
    let mut session =
        ApprovalSession::new(config(&["approver1"], 0), vocabulary, &tracker).unwrap();

    let (_tx, cancel) = never_cancelled();
    let outcome = session.run(cancel).await.unwrap();

    assert_eq!(outcome.state, SessionState::Approved);
}
