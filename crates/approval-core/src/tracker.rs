//! Issue tracker capability and the GitHub REST implementation

use crate::error::{GateError, Result};
use crate::quorum::Comment;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const COMMENTS_PER_PAGE: usize = 100;

/// Request to open a tracking issue
///
/// `labels` is omitted from the wire payload entirely when `None`; GitHub
/// distinguishes an absent labels field from an empty list.
#[derive(Debug, Clone, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// The tracking issue assigned by the tracker, owned by the session once
/// created
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalIssue {
    pub number: u64,
    pub html_url: String,
}

/// Abstract issue-tracker capability consumed by the approval session
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Open the tracking issue; failure here is fatal for the session
    async fn create_issue(&self, issue: &NewIssue) -> Result<ApprovalIssue>;

    /// Fetch all comments on the tracking issue in chronological order
    async fn list_comments(&self, issue_number: u64) -> Result<Vec<Comment>>;

    /// Post a comment on the tracking issue
    async fn post_comment(&self, issue_number: u64, body: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubComment {
    user: GithubUser,
    body: Option<String>,
}

/// GitHub REST v3 client for the [`IssueTracker`] capability
///
/// The base URL is configurable for GitHub Enterprise installations and for
/// tests.
pub struct GithubTracker {
    base_url: String,
    owner: String,
    repo: String,
    token: String,
    http_client: HttpClient,
}

impl GithubTracker {
    pub fn new(
        base_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        let http_client = HttpClient::builder()
            .timeout(request_timeout)
            .user_agent("approval-gate")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
            http_client,
        }
    }

    fn issues_url(&self) -> String {
        format!("{}/repos/{}/{}/issues", self.base_url, self.owner, self.repo)
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    async fn error_from_response(context: &str, response: reqwest::Response) -> GateError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        GateError::Tracker(format!("{} failed with {}: {}", context, status, body))
    }
}

#[async_trait]
impl IssueTracker for GithubTracker {
    async fn create_issue(&self, issue: &NewIssue) -> Result<ApprovalIssue> {
        let response = self
            .http_client
            .post(self.issues_url())
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github+json")
            .json(issue)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("issue creation", response).await);
        }

        let created: ApprovalIssue = response.json().await?;
        Ok(created)
    }

    async fn list_comments(&self, issue_number: u64) -> Result<Vec<Comment>> {
        let url = format!("{}/{}/comments", self.issues_url(), issue_number);
        let mut comments = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .http_client
                .get(&url)
                .header("Authorization", self.auth_header())
                .header("Accept", "application/vnd.github+json")
                .query(&[
                    ("per_page", COMMENTS_PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Self::error_from_response("comment listing", response).await);
            }

            let batch: Vec<GithubComment> = response.json().await?;
            let batch_len = batch.len();

            comments.extend(batch.into_iter().map(|c| Comment {
                author: c.user.login,
                body: c.body.unwrap_or_default(),
            }));

            if batch_len < COMMENTS_PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(comments)
    }

    async fn post_comment(&self, issue_number: u64, body: &str) -> Result<()> {
        let url = format!("{}/{}/comments", self.issues_url(), issue_number);
        let payload = serde_json::json!({ "body": body });

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github+json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response("comment creation", response).await);
        }

        Ok(())
    }
}
