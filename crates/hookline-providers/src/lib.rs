//! Git provider adapters for Hookline.
//!
//! Each adapter implements [`GitClient`] for one git host:
//! - GitHub: HMAC-SHA1 signed webhooks, `Authorization: token` API calls
//! - GitLab: shared-token webhooks, `PRIVATE-TOKEN` API calls

mod api;
pub mod error;
pub mod github;
pub mod gitlab;
pub mod signature;

pub use error::GitError;
pub use github::GitHubClient;
pub use gitlab::GitLabClient;

use hookline_core::GitClient;
use hookline_core::git::GitHost;
use hookline_core::integration::IntegrationConfig;

/// Build the adapter for the git host named in `config`.
///
/// Outbound calls go through `http`, so timeouts and proxies are whatever the
/// caller configured on it.
pub fn client_for(config: &IntegrationConfig, http: reqwest::Client) -> Box<dyn GitClient> {
    match config.git.host {
        GitHost::Github => Box::new(GitHubClient::new(config, http)),
        GitHost::Gitlab => Box::new(GitLabClient::new(config, http)),
    }
}
