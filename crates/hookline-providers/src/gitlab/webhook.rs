//! GitLab webhook payloads and their canonical form.

use chrono::{DateTime, NaiveDateTime, Utc};
use hookline_core::git::{
    self, BaseRef, HeadRef, IssueComment, PullRequestAction, PullRequestState, Webhook,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::GitError;

#[derive(Debug, Deserialize)]
pub(crate) struct MergeRequestWebhook {
    pub user: User,
    pub project: Project,
    pub object_attributes: MergeRequestAttributes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MergeRequestAttributes {
    pub iid: u64,
    #[serde(default)]
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub action: Option<String>,
    pub url: String,
    pub source_branch: String,
    pub target_branch: String,
    pub last_commit: LastCommit,
    /// Previous head; only set on updates that pushed new commits.
    #[serde(default)]
    pub oldrev: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LastCommit {
    pub id: String,
}

/// Shared by `Push Hook` and `Tag Push Hook`.
#[derive(Debug, Deserialize)]
pub(crate) struct PushWebhook {
    pub r#ref: String,
    pub after: String,
    pub user_id: u64,
    pub user_username: String,
    #[serde(default)]
    pub user_email: Option<String>,
    pub project: Project,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteWebhook {
    pub user: User,
    pub project: Project,
    pub object_attributes: NoteAttributes,
    #[serde(default)]
    pub merge_request: Option<Noteable>,
    #[serde(default)]
    pub issue: Option<Noteable>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteAttributes {
    pub note: String,
    pub noteable_type: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Noteable {
    pub iid: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Project {
    pub path_with_namespace: String,
    pub web_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WebhookEntry {
    pub id: u64,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegistrationBody<'a> {
    pub id: &'a str,
    pub url: &'a str,
    pub token: &'a str,
    pub push_events: bool,
    pub tag_push_events: bool,
    pub merge_requests_events: bool,
    pub note_events: bool,
    pub confidential_note_events: bool,
    pub issues_events: bool,
    pub confidential_issues_events: bool,
    pub job_events: bool,
    pub pipeline_events: bool,
    pub wiki_page_events: bool,
    pub deployment_events: bool,
    pub enable_ssl_verification: bool,
}

impl<'a> RegistrationBody<'a> {
    /// Subscribe to every event type.
    pub fn all_events(id: &'a str, url: &'a str, token: &'a str) -> Self {
        Self {
            id,
            url,
            token,
            push_events: true,
            tag_push_events: true,
            merge_requests_events: true,
            note_events: true,
            confidential_note_events: true,
            issues_events: true,
            confidential_issues_events: true,
            job_events: true,
            pipeline_events: true,
            wiki_page_events: true,
            deployment_events: true,
            enable_ssl_verification: false,
        }
    }
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
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub public_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserPermission {
    pub access_level: u32,
}

impl From<User> for git::User {
    fn from(user: User) -> Self {
        git::User {
            id: user.id,
            name: user.username,
            email: user.email,
        }
    }
}

impl From<Project> for git::Repository {
    fn from(project: Project) -> Self {
        git::Repository {
            name: project.path_with_namespace,
            url: project.web_url,
        }
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, GitError> {
    serde_json::from_slice(body).map_err(|e| GitError::Parse(e.to_string()))
}

/// GitLab has used both RFC 3339 and `2024-03-01 10:00:00 UTC` for note timestamps.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S UTC")
                .map(|t| t.and_utc())
                .ok()
        })
}

fn action(attrs: &MergeRequestAttributes) -> PullRequestAction {
    match attrs.action.as_deref() {
        Some("open") => PullRequestAction::Opened,
        Some("reopen") => PullRequestAction::Reopened,
        Some("update") if attrs.oldrev.is_some() => PullRequestAction::Synchronized,
        Some("close") | Some("merge") => PullRequestAction::Closed,
        other => PullRequestAction::Other(other.unwrap_or_default().to_string()),
    }
}

pub(crate) fn parse_merge_request(body: &[u8]) -> Result<Webhook, GitError> {
    let data: MergeRequestWebhook = decode(body)?;
    let action = action(&data.object_attributes);
    let attrs = data.object_attributes;

    let pr = git::PullRequest {
        id: attrs.iid,
        action,
        title: attrs.title,
        state: if attrs.state == "opened" {
            PullRequestState::Open
        } else {
            PullRequestState::Closed
        },
        url: attrs.url,
        sender: data.user.into(),
        base: BaseRef {
            r#ref: attrs.target_branch,
        },
        head: HeadRef {
            r#ref: attrs.source_branch,
            sha: attrs.last_commit.id,
        },
    };
    Ok(Webhook::pull_request(data.project.into(), pr))
}

pub(crate) fn parse_push(body: &[u8]) -> Result<Webhook, GitError> {
    let data: PushWebhook = decode(body)?;
    let push = git::Push {
        r#ref: data.r#ref,
        sha: data.after,
        sender: git::User {
            id: data.user_id,
            name: data.user_username,
            email: data.user_email,
        },
    };
    Ok(Webhook::push(data.project.into(), push))
}

/// Notes on commits and snippets have no canonical form and yield `None`.
pub(crate) fn parse_note(body: &[u8]) -> Result<Option<Webhook>, GitError> {
    let data: NoteWebhook = decode(body)?;
    let (noteable, is_pull_request) = match data.object_attributes.noteable_type.as_str() {
        "MergeRequest" => (data.merge_request, true),
        "Issue" => (data.issue, false),
        _ => return Ok(None),
    };
    let noteable = noteable.ok_or_else(|| {
        GitError::Parse(format!(
            "note on {} without its target",
            data.object_attributes.noteable_type
        ))
    })?;

    let comment = IssueComment {
        comment: git::Comment {
            body: data.object_attributes.note,
            created_at: data
                .object_attributes
                .created_at
                .as_deref()
                .and_then(parse_timestamp),
        },
        issue_number: noteable.iid,
        is_pull_request,
        sender: data.user.into(),
    };
    Ok(Some(Webhook::issue_comment(data.project.into(), comment)))
}
