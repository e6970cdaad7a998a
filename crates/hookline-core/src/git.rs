//! Canonical webhook model shared by every git provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported git hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitHost {
    Github,
    Gitlab,
}

impl std::fmt::Display for GitHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitHost::Github => write!(f, "github"),
            GitHost::Gitlab => write!(f, "gitlab"),
        }
    }
}

impl std::str::FromStr for GitHost {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(GitHost::Github),
            "gitlab" => Ok(GitHost::Gitlab),
            _ => Err(format!("Unknown git host: {}", s)),
        }
    }
}

/// Kind of event carried by a [`Webhook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PullRequest,
    Push,
    IssueComment,
    ReviewSubmitted,
    ReviewComment,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventType::PullRequest => "pull_request",
            EventType::Push => "push",
            EventType::IssueComment => "issue_comment",
            EventType::ReviewSubmitted => "review_submitted",
            EventType::ReviewComment => "review_comment",
        };
        f.write_str(s)
    }
}

/// Provider-independent webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub event_type: EventType,
    pub repository: Repository,
    pub sender: User,
    pub pull_request: Option<PullRequest>,
    pub push: Option<Push>,
    pub issue_comment: Option<IssueComment>,
    pub review: Option<Review>,
}

impl Webhook {
    pub fn pull_request(repository: Repository, pr: PullRequest) -> Self {
        Self {
            event_type: EventType::PullRequest,
            repository,
            sender: pr.sender.clone(),
            pull_request: Some(pr),
            push: None,
            issue_comment: None,
            review: None,
        }
    }

    pub fn push(repository: Repository, push: Push) -> Self {
        Self {
            event_type: EventType::Push,
            repository,
            sender: push.sender.clone(),
            pull_request: None,
            push: Some(push),
            issue_comment: None,
            review: None,
        }
    }

    pub fn issue_comment(repository: Repository, comment: IssueComment) -> Self {
        Self {
            event_type: EventType::IssueComment,
            repository,
            sender: comment.sender.clone(),
            pull_request: None,
            push: None,
            issue_comment: Some(comment),
            review: None,
        }
    }

    pub fn review(event_type: EventType, repository: Repository, review: Review) -> Self {
        Self {
            event_type,
            repository,
            sender: review.sender.clone(),
            pull_request: Some(review.pull_request.clone()),
            push: None,
            issue_comment: None,
            review: Some(review),
        }
    }
}

/// Repository the event originated from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Full name, e.g. `org/project`.
    pub name: String,
    /// Browsable URL.
    pub url: String,
}

/// A git host account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    Opened,
    Synchronized,
    Reopened,
    Closed,
    Other(String),
}

impl PullRequestAction {
    /// Actions that put new code up for review.
    pub fn is_triggering(&self) -> bool {
        matches!(
            self,
            PullRequestAction::Opened | PullRequestAction::Synchronized | PullRequestAction::Reopened
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub action: PullRequestAction,
    pub title: String,
    pub state: PullRequestState,
    pub url: String,
    pub sender: User,
    pub base: BaseRef,
    pub head: HeadRef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseRef {
    pub r#ref: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeadRef {
    pub r#ref: String,
    pub sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Push {
    /// Raw ref, e.g. `refs/heads/main` or `refs/tags/v1`.
    pub r#ref: String,
    /// Head commit after the push.
    pub sha: String,
    pub sender: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A comment on an issue or pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComment {
    pub comment: Comment,
    pub issue_number: u64,
    /// Set when the commented issue is a pull request.
    pub is_pull_request: bool,
    pub sender: User,
}

/// A pull request review, or a comment left on one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub body: String,
    pub state: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub pull_request: PullRequest,
    pub sender: User,
}

/// Canonical commit status, translated per provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitStatusState {
    Pending,
    Success,
    Failure,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Issue,
    PullRequest,
}

/// A webhook registered on the remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEntry {
    pub id: u64,
    pub url: String,
}
