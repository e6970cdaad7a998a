//! GitHub webhook payloads and their canonical form.

use chrono::{DateTime, Utc};
use hookline_core::git::{
    self, BaseRef, EventType, HeadRef, IssueComment, PullRequestAction, PullRequestState,
    Webhook,
};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::GitError;

#[derive(Debug, Deserialize)]
pub(crate) struct PullRequestWebhook {
    pub action: String,
    pub sender: User,
    pub pull_request: PullRequest,
    pub repository: Repo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PushWebhook {
    pub r#ref: String,
    pub after: String,
    pub repository: Repo,
    pub sender: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueCommentWebhook {
    pub comment: Comment,
    pub issue: Issue,
    pub repository: Repo,
    pub sender: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Issue {
    pub number: u64,
    /// Present only when the issue is a pull request.
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullRequestReviewWebhook {
    pub action: String,
    pub review: ReviewBody,
    pub pull_request: PullRequest,
    pub repository: Repo,
    pub sender: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewBody {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullRequestReviewCommentWebhook {
    pub action: String,
    pub comment: Comment,
    pub pull_request: PullRequest,
    pub repository: Repo,
    pub sender: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Repo {
    pub full_name: String,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub state: String,
    pub html_url: String,
    pub head: Head,
    pub base: Base,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Head {
    pub r#ref: String,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Base {
    pub r#ref: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct User {
    pub login: String,
    pub id: u64,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Comment {
    pub body: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WebhookEntry {
    pub id: u64,
    pub config: WebhookEntryConfig,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WebhookEntryConfig {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegistrationBody<'a> {
    pub name: &'static str,
    pub active: bool,
    pub events: Vec<&'static str>,
    pub config: RegistrationConfig<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegistrationConfig<'a> {
    pub url: &'a str,
    pub content_type: &'static str,
    pub insecure_ssl: &'static str,
    pub secret: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommitStatusBody<'a> {
    pub state: &'static str,
    pub target_url: &'a str,
    pub description: &'a str,
    pub context: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentBody<'a> {
    pub body: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserInfo {
    pub login: String,
    pub id: u64,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserPermission {
    pub permission: String,
}

impl From<User> for git::User {
    fn from(user: User) -> Self {
        git::User {
            id: user.id,
            name: user.login,
            email: user.email,
        }
    }
}

impl From<Repo> for git::Repository {
    fn from(repo: Repo) -> Self {
        git::Repository {
            name: repo.full_name,
            url: repo.html_url,
        }
    }
}

impl From<Comment> for git::Comment {
    fn from(comment: Comment) -> Self {
        git::Comment {
            body: comment.body,
            created_at: comment.created_at,
        }
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, GitError> {
    serde_json::from_slice(body).map_err(|e| GitError::Parse(e.to_string()))
}

fn action(action: &str) -> PullRequestAction {
    match action {
        "opened" => PullRequestAction::Opened,
        "synchronize" => PullRequestAction::Synchronized,
        "reopened" => PullRequestAction::Reopened,
        "closed" => PullRequestAction::Closed,
        other => PullRequestAction::Other(other.to_string()),
    }
}

fn pull_request(pr: PullRequest, action: PullRequestAction, sender: git::User) -> git::PullRequest {
    git::PullRequest {
        id: pr.number,
        action,
        title: pr.title,
        state: if pr.state == "open" {
            PullRequestState::Open
        } else {
            PullRequestState::Closed
        },
        url: pr.html_url,
        sender,
        base: BaseRef { r#ref: pr.base.r#ref },
        head: HeadRef {
            r#ref: pr.head.r#ref,
            sha: pr.head.sha,
        },
    }
}

pub(crate) fn parse_pull_request(body: &[u8]) -> Result<Webhook, GitError> {
    let data: PullRequestWebhook = decode(body)?;
    let pr = pull_request(data.pull_request, action(&data.action), data.sender.into());
    Ok(Webhook::pull_request(data.repository.into(), pr))
}

pub(crate) fn parse_push(body: &[u8]) -> Result<Webhook, GitError> {
    let data: PushWebhook = decode(body)?;
    let push = git::Push {
        r#ref: data.r#ref,
        sha: data.after,
        sender: data.sender.into(),
    };
    Ok(Webhook::push(data.repository.into(), push))
}

pub(crate) fn parse_issue_comment(body: &[u8]) -> Result<Webhook, GitError> {
    let data: IssueCommentWebhook = decode(body)?;
    let comment = IssueComment {
        comment: data.comment.into(),
        issue_number: data.issue.number,
        is_pull_request: data.issue.pull_request.is_some(),
        sender: data.sender.into(),
    };
    Ok(Webhook::issue_comment(data.repository.into(), comment))
}

pub(crate) fn parse_review(body: &[u8]) -> Result<Webhook, GitError> {
    let data: PullRequestReviewWebhook = decode(body)?;
    let sender: git::User = data.sender.into();
    let review = git::Review {
        body: data.review.body.unwrap_or_default(),
        state: data.review.state,
        submitted_at: data.review.submitted_at,
        pull_request: pull_request(
            data.pull_request,
            PullRequestAction::Other(data.action),
            sender.clone(),
        ),
        sender,
    };
    Ok(Webhook::review(
        EventType::ReviewSubmitted,
        data.repository.into(),
        review,
    ))
}

pub(crate) fn parse_review_comment(body: &[u8]) -> Result<Webhook, GitError> {
    let data: PullRequestReviewCommentWebhook = decode(body)?;
    let sender: git::User = data.sender.into();
    let review = git::Review {
        body: data.comment.body,
        state: None,
        submitted_at: data.comment.created_at,
        pull_request: pull_request(
            data.pull_request,
            PullRequestAction::Other(data.action),
            sender.clone(),
        ),
        sender,
    };
    Ok(Webhook::review(
        EventType::ReviewComment,
        data.repository.into(),
        review,
    ))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pull_request() {
        let webhook = parse_pull_request(fixtures::PULL_REQUEST.as_bytes()).unwrap();
        assert_eq!(webhook.event_type, EventType::PullRequest);
        assert_eq!(webhook.repository.name, "org/repo");
        assert_eq!(webhook.repository.url, "https://github.com/org/repo");
        assert!(webhook.push.is_none());

        let pr = webhook.pull_request.unwrap();
        assert_eq!(pr.id, 7);
        assert_eq!(pr.action, PullRequestAction::Opened);
        assert_eq!(pr.state, PullRequestState::Open);
        assert_eq!(pr.title, "Add widgets");
        assert_eq!(pr.base.r#ref, "main");
        assert_eq!(pr.head.r#ref, "feature/widgets");
        assert_eq!(pr.head.sha, "0123456789abcdef0123456789abcdef01234567");
        assert_eq!(pr.sender.name, "octocat");
        assert_eq!(pr.sender.id, 583231);
    }

    #[test]
    fn test_synchronize_action() {
        let body = fixtures::PULL_REQUEST.replace("\"opened\"", "\"synchronize\"");
        let webhook = parse_pull_request(body.as_bytes()).unwrap();
        assert_eq!(
            webhook.pull_request.unwrap().action,
            PullRequestAction::Synchronized
        );
    }

    #[test]
    fn test_unknown_action_preserved() {
        let body = fixtures::PULL_REQUEST.replace("\"opened\"", "\"labeled\"");
        let webhook = parse_pull_request(body.as_bytes()).unwrap();
        assert_eq!(
            webhook.pull_request.unwrap().action,
            PullRequestAction::Other("labeled".to_string())
        );
    }

    #[test]
    fn test_parse_push() {
        let webhook = parse_push(fixtures::PUSH.as_bytes()).unwrap();
        assert_eq!(webhook.event_type, EventType::Push);
        assert!(webhook.pull_request.is_none());

        let push = webhook.push.unwrap();
        assert_eq!(push.r#ref, "refs/heads/main");
        assert_eq!(push.sha, "fedcba9876543210fedcba9876543210fedcba98");
        assert_eq!(push.sender.email.as_deref(), Some("octocat@github.com"));
        assert_eq!(webhook.sender.name, "octocat");
    }

    #[test]
    fn test_parse_issue_comment() {
        let webhook = parse_issue_comment(fixtures::ISSUE_COMMENT.as_bytes()).unwrap();
        assert_eq!(webhook.event_type, EventType::IssueComment);
        let comment = webhook.issue_comment.unwrap();
        assert_eq!(comment.comment.body, "/retest");
        assert_eq!(comment.issue_number, 7);
        assert!(comment.is_pull_request);
        assert!(comment.comment.created_at.is_some());
        assert_eq!(comment.sender.name, "hubot");
    }

    #[test]
    fn test_parse_review() {
        let webhook = parse_review(fixtures::REVIEW.as_bytes()).unwrap();
        assert_eq!(webhook.event_type, EventType::ReviewSubmitted);
        let review = webhook.review.unwrap();
        assert_eq!(review.body, "Looks good");
        assert_eq!(review.state.as_deref(), Some("approved"));
        assert_eq!(review.pull_request.id, 7);
        // Review events never count as new code
        assert!(!review.pull_request.action.is_triggering());
    }

    #[test]
    fn test_missing_fields_is_parse_error() {
        let result = parse_push(b"{}");
        assert!(matches!(result, Err(GitError::Parse(_))));
    }
}
