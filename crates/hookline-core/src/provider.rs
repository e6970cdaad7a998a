//! Git provider protocol.
//!
//! Every supported git host implements [`GitClient`]. The dispatcher only sees
//! the canonical [`Webhook`] produced by `parse_webhook`, so adding a host
//! never touches filtering or dispatch.

use async_trait::async_trait;
use http::HeaderMap;

use crate::Result;
use crate::git::{CommitStatusState, IssueType, User, Webhook, WebhookEntry};
use crate::run::IntegrationJob;

#[async_trait]
pub trait GitClient: Send + Sync {
    /// Name of the git host.
    fn name(&self) -> &'static str;

    /// Authenticate and parse a raw webhook delivery.
    ///
    /// Returns `Ok(None)` for event types the host sends but this system
    /// does not model. Authentication always happens before parsing.
    fn parse_webhook(&self, headers: &HeaderMap, body: &[u8]) -> Result<Option<Webhook>>;

    /// List webhooks registered on the repository.
    async fn list_webhooks(&self) -> Result<Vec<WebhookEntry>>;

    /// Register `url` as a webhook receiver on the repository.
    async fn register_webhook(&self, url: &str) -> Result<()>;

    /// Delete a registered webhook.
    async fn delete_webhook(&self, id: u64) -> Result<()>;

    /// Report a commit status for the commit a run was built from.
    async fn set_commit_status(
        &self,
        job: &IntegrationJob,
        context: &str,
        state: CommitStatusState,
        description: &str,
        target_url: &str,
    ) -> Result<()>;

    /// Look up a user by login (GitHub) or numeric ID (GitLab).
    async fn get_user_info(&self, user: &str) -> Result<User>;

    /// Whether `user` may push to the repository.
    async fn can_user_write_to_repo(&self, user: &User) -> Result<bool>;

    /// Post a comment on an issue or pull request.
    async fn register_comment(
        &self,
        issue_type: IssueType,
        issue_number: u64,
        body: &str,
    ) -> Result<()>;
}
