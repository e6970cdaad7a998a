//! GitLab adapter.

mod webhook;

use async_trait::async_trait;
use hookline_core::git::{CommitStatusState, IssueType, User, Webhook, WebhookEntry};
use hookline_core::integration::IntegrationConfig;
use hookline_core::run::IntegrationJob;
use hookline_core::{GitClient, Result};
use http::HeaderMap;
use tracing::{debug, info};

use crate::GitError;
use crate::api::{ApiClient, header};
use webhook::{CommentBody, CommitStatusBody, RegistrationBody};

/// Header carrying the shared webhook token.
pub const TOKEN_HEADER: &str = "x-gitlab-token";
/// Header naming the delivered event.
pub const EVENT_HEADER: &str = "x-gitlab-event";

/// Minimum access level (Developer) allowed to push.
const WRITE_ACCESS_LEVEL: u32 = 30;

/// GitLab client bound to one project.
pub struct GitLabClient {
    api: ApiClient,
    /// `{server}/api/v4/projects/{encoded path}`
    project_url: String,
    api_url: String,
    encoded_path: String,
    secret: String,
}

impl GitLabClient {
    pub fn new(config: &IntegrationConfig, http: reqwest::Client) -> Self {
        let api_url = format!("{}/api/v4", config.git.api_url());
        let encoded_path = urlencoding::encode(&config.git.repository).into_owned();
        let auth = config
            .git
            .token
            .as_ref()
            .map(|token| ("private-token", token.clone()));
        Self {
            api: ApiClient::new(http, auth, &[]),
            project_url: format!("{}/projects/{}", api_url, encoded_path),
            api_url,
            encoded_path,
            secret: config.webhook_secret.clone(),
        }
    }

    fn validate_token(&self, token: &str) -> std::result::Result<(), GitError> {
        if token != self.secret {
            return Err(GitError::Authentication(
                "X-Gitlab-Token does not match secret".to_string(),
            ));
        }
        Ok(())
    }
}

fn status_state(state: CommitStatusState) -> &'static str {
    match state {
        CommitStatusState::Pending => "running",
        CommitStatusState::Success => "success",
        CommitStatusState::Failure | CommitStatusState::Error => "failed",
    }
}

/// GitLab refuses to move a status to the state it already holds.
fn is_redundant_transition(err: &GitError) -> bool {
    matches!(err, GitError::Api { message, .. }
        if message.to_lowercase().contains("cannot transition status via"))
}

#[async_trait]
impl GitClient for GitLabClient {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn parse_webhook(&self, headers: &HeaderMap, body: &[u8]) -> Result<Option<Webhook>> {
        self.validate_token(header(headers, TOKEN_HEADER).unwrap_or_default())?;

        let event = header(headers, EVENT_HEADER).unwrap_or_default();
        let webhook = match event {
            "Merge Request Hook" => Some(webhook::parse_merge_request(body)?),
            "Push Hook" | "Tag Push Hook" => Some(webhook::parse_push(body)?),
            "Note Hook" => webhook::parse_note(body)?,
            other => {
                debug!(event = other, "Ignoring unsupported GitLab event");
                None
            }
        };

        Ok(webhook)
    }

    async fn list_webhooks(&self) -> Result<Vec<WebhookEntry>> {
        let hooks: Vec<webhook::WebhookEntry> = self
            .api
            .get_json(&format!("{}/hooks", self.project_url))
            .await?;
        Ok(hooks
            .into_iter()
            .map(|hook| WebhookEntry {
                id: hook.id,
                url: hook.url,
            })
            .collect())
    }

    async fn register_webhook(&self, url: &str) -> Result<()> {
        let body = RegistrationBody::all_events(&self.encoded_path, url, &self.secret);
        self.api
            .post(&format!("{}/hooks", self.project_url), &body)
            .await?;
        info!(project = %self.encoded_path, url, "Registered GitLab webhook");
        Ok(())
    }

    async fn delete_webhook(&self, id: u64) -> Result<()> {
        self.api
            .delete(&format!("{}/hooks/{}", self.project_url, id))
            .await?;
        info!(project = %self.encoded_path, id, "Deleted GitLab webhook");
        Ok(())
    }

    async fn set_commit_status(
        &self,
        job: &IntegrationJob,
        context: &str,
        state: CommitStatusState,
        description: &str,
        target_url: &str,
    ) -> Result<()> {
        let url = format!("{}/statuses/{}", self.project_url, job.status_sha());
        let body = CommitStatusBody {
            state: status_state(state),
            target_url,
            description,
            context,
        };

        match self.api.post(&url, &body).await {
            Ok(()) => Ok(()),
            Err(e) if is_redundant_transition(&e) => {
                debug!(sha = job.status_sha(), context, "Commit status already set");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `user` is the numeric GitLab user ID.
    async fn get_user_info(&self, user: &str) -> Result<User> {
        let info: webhook::UserInfo = self
            .api
            .get_json(&format!("{}/users/{}", self.api_url, user))
            .await?;
        let email = info
            .public_email
            .filter(|e| !e.is_empty())
            .or(info.email);
        Ok(User {
            id: info.id,
            name: info.username,
            email,
        })
    }

    async fn can_user_write_to_repo(&self, user: &User) -> Result<bool> {
        let permission: webhook::UserPermission = self
            .api
            .get_json(&format!("{}/members/all/{}", self.project_url, user.id))
            .await?;
        Ok(permission.access_level >= WRITE_ACCESS_LEVEL)
    }

    async fn register_comment(
        &self,
        issue_type: IssueType,
        issue_number: u64,
        body: &str,
    ) -> Result<()> {
        let kind = match issue_type {
            IssueType::Issue => "issues",
            IssueType::PullRequest => "merge_requests",
        };
        self.api
            .post(
                &format!("{}/{}/{}/notes", self.project_url, kind, issue_number),
                &CommentBody { body },
            )
            .await?;
        Ok(())
    }
}
