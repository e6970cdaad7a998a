//! GitHub adapter.

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
use crate::signature::verify_sha1_signature;
use webhook::{CommentBody, CommitStatusBody, RegistrationBody, RegistrationConfig};

/// Header carrying the HMAC-SHA1 signature of the delivery.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";
/// Header naming the delivered event.
pub const EVENT_HEADER: &str = "x-github-event";

/// GitHub client bound to one repository.
pub struct GitHubClient {
    api: ApiClient,
    api_url: String,
    repository: String,
    secret: String,
}

impl GitHubClient {
    pub fn new(config: &IntegrationConfig, http: reqwest::Client) -> Self {
        let auth = config
            .git
            .token
            .as_ref()
            .map(|token| ("authorization", format!("token {}", token)));
        Self {
            api: ApiClient::new(http, auth, &[("accept", "application/vnd.github.v3+json")]),
            api_url: config.git.api_url(),
            repository: config.git.repository.clone(),
            secret: config.webhook_secret.clone(),
        }
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}{}", self.api_url, self.repository, path)
    }
}

fn status_state(state: CommitStatusState) -> &'static str {
    match state {
        CommitStatusState::Pending => "pending",
        CommitStatusState::Success => "success",
        CommitStatusState::Failure => "failure",
        CommitStatusState::Error => "error",
    }
}

#[async_trait]
impl GitClient for GitHubClient {
    fn name(&self) -> &'static str {
        "github"
    }

    fn parse_webhook(&self, headers: &HeaderMap, body: &[u8]) -> Result<Option<Webhook>> {
        let signature = header(headers, SIGNATURE_HEADER).ok_or_else(|| {
            GitError::Authentication("missing X-Hub-Signature header".to_string())
        })?;
        verify_sha1_signature(&self.secret, body, signature)?;

        let event = header(headers, EVENT_HEADER).unwrap_or_default();
        let webhook = match event {
            "pull_request" => webhook::parse_pull_request(body)?,
            "push" => webhook::parse_push(body)?,
            "issue_comment" => webhook::parse_issue_comment(body)?,
            "pull_request_review" => webhook::parse_review(body)?,
            "pull_request_review_comment" => webhook::parse_review_comment(body)?,
            other => {
                debug!(event = other, "Ignoring unsupported GitHub event");
                return Ok(None);
            }
        };

        Ok(Some(webhook))
    }

    async fn list_webhooks(&self) -> Result<Vec<WebhookEntry>> {
        let hooks: Vec<webhook::WebhookEntry> = self.api.get_json(&self.repo_url("/hooks")).await?;
        Ok(hooks
            .into_iter()
            .map(|hook| WebhookEntry {
                id: hook.id,
                url: hook.config.url,
            })
            .collect())
    }

    async fn register_webhook(&self, url: &str) -> Result<()> {
        let body = RegistrationBody {
            name: "web",
            active: true,
            events: vec!["*"],
            config: RegistrationConfig {
                url,
                content_type: "json",
                insecure_ssl: "0",
                secret: &self.secret,
            },
        };
        self.api.post(&self.repo_url("/hooks"), &body).await?;
        info!(repository = %self.repository, url, "Registered GitHub webhook");
        Ok(())
    }

    async fn delete_webhook(&self, id: u64) -> Result<()> {
        self.api
            .delete(&self.repo_url(&format!("/hooks/{}", id)))
            .await?;
        info!(repository = %self.repository, id, "Deleted GitHub webhook");
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
        let url = format!(
            "{}/repos/{}/statuses/{}",
            self.api_url,
            job.spec.refs.repository,
            job.status_sha()
        );
        let body = CommitStatusBody {
            state: status_state(state),
            target_url,
            description,
            context,
        };
        self.api.post(&url, &body).await?;
        Ok(())
    }

    async fn get_user_info(&self, user: &str) -> Result<User> {
        let info: webhook::UserInfo = self
            .api
            .get_json(&format!("{}/users/{}", self.api_url, user))
            .await?;
        Ok(User {
            id: info.id,
            name: info.login,
            email: info.email,
        })
    }

    async fn can_user_write_to_repo(&self, user: &User) -> Result<bool> {
        let permission: webhook::UserPermission = self
            .api
            .get_json(&self.repo_url(&format!("/collaborators/{}/permission", user.name)))
            .await?;
        Ok(matches!(permission.permission.as_str(), "admin" | "write"))
    }

    async fn register_comment(
        &self,
        _issue_type: IssueType,
        issue_number: u64,
        body: &str,
    ) -> Result<()> {
        // Pull requests share the issue comment endpoint.
        self.api
            .post(
                &self.repo_url(&format!("/issues/{}/comments", issue_number)),
                &CommentBody { body },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::sign_payload;
    use hookline_core::git::{EventType, GitHost};
    use hookline_core::integration::GitConfig;
    use hookline_core::job::JobType;
    use hookline_core::run::{
        BaseRefs, ConfigRef, IntegrationJobSpec, PullAuthor, PullRefs, Refs, RunMeta,
    };
    use hookline_core::{Error, RunId};
    use http::HeaderValue;
    use wiremock::matchers::{body_partial_json, header as header_is, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECRET: &str = "s3cret";

    fn config(server_url: Option<String>) -> IntegrationConfig {
        IntegrationConfig::new(
            "app",
            "ci",
            GitConfig {
                host: GitHost::Github,
                repository: "org/repo".to_string(),
                server_url,
                token: Some("ghp_test".to_string()),
            },
            SECRET,
        )
    }

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::new(&config(Some(server.uri())), reqwest::Client::new())
    }

    fn signed_headers(event: &str, body: &[u8]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_HEADER, HeaderValue::from_str(event).unwrap());
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&sign_payload(SECRET, body).unwrap()).unwrap(),
        );
        headers
    }

    fn pre_submit_job() -> IntegrationJob {
        IntegrationJob {
            metadata: RunMeta::default(),
            spec: IntegrationJobSpec {
                config_ref: ConfigRef {
                    name: "app".to_string(),
                    r#type: JobType::PreSubmit,
                },
                id: RunId::new("abcdefghijklmnopqrst"),
                jobs: Vec::new(),
                workspaces: Vec::new(),
                refs: Refs {
                    repository: "org/repo".to_string(),
                    link: "https://github.com/org/repo".to_string(),
                    sender: None,
                    base: BaseRefs {
                        r#ref: "main".to_string(),
                        link: "https://github.com/org/repo".to_string(),
                        sha: String::new(),
                    },
                    pull: Some(PullRefs {
                        id: 7,
                        r#ref: "feature".to_string(),
                        sha: "0123456789abcdef".to_string(),
                        link: "https://github.com/org/repo/pull/7".to_string(),
                        author: PullAuthor {
                            name: "octocat".to_string(),
                        },
                    }),
                },
                pod_template: None,
            },
        }
    }

    #[test]
    fn test_parse_signed_push() {
        let client = GitHubClient::new(&config(None), reqwest::Client::new());
        let body = webhook::fixtures::PUSH.as_bytes();

        let webhook = client
            .parse_webhook(&signed_headers("push", body), body)
            .unwrap()
            .unwrap();
        assert_eq!(webhook.event_type, EventType::Push);
        assert_eq!(webhook.push.unwrap().r#ref, "refs/heads/main");
    }

    #[test]
    fn test_bad_signature_rejected() {
        let client = GitHubClient::new(&config(None), reqwest::Client::new());
        let body = webhook::fixtures::PUSH.as_bytes();
        let mut headers = signed_headers("push", body);
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_static("sha1=0000000000000000000000000000000000000000"),
        );

        let result = client.parse_webhook(&headers, body);
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[test]
    fn test_missing_signature_rejected() {
        let client = GitHubClient::new(&config(None), reqwest::Client::new());
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_HEADER, HeaderValue::from_static("push"));

        let result = client.parse_webhook(&headers, webhook::fixtures::PUSH.as_bytes());
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[test]
    fn test_authentication_precedes_parsing() {
        // A malformed body with a bad signature must fail authentication,
        // not parsing.
        let client = GitHubClient::new(&config(None), reqwest::Client::new());
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_HEADER, HeaderValue::from_static("push"));
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_static("sha1=deadbeef"));

        let result = client.parse_webhook(&headers, b"not json");
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[test]
    fn test_unsupported_event_ignored() {
        let client = GitHubClient::new(&config(None), reqwest::Client::new());
        let body = br#"{"zen": "Keep it logically awesome."}"#;

        let result = client.parse_webhook(&signed_headers("ping", body), body).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_signed_but_malformed_payload() {
        let client = GitHubClient::new(&config(None), reqwest::Client::new());
        let body = b"{}";

        let result = client.parse_webhook(&signed_headers("pull_request", body), body);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_set_commit_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/repos/org/repo/statuses/0123456789abcdef"))
            .and(header_is("authorization", "token ghp_test"))
            .and(body_partial_json(serde_json::json!({
                "state": "failure",
                "context": "hookline/unit",
                "description": "Tests failed",
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .set_commit_status(
                &pre_submit_job(),
                "hookline/unit",
                CommitStatusState::Failure,
                "Tests failed",
                "https://ci.example.com/runs/1",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_commit_status_translation() {
        let cases = [
            (CommitStatusState::Pending, "pending"),
            (CommitStatusState::Success, "success"),
            (CommitStatusState::Failure, "failure"),
            (CommitStatusState::Error, "error"),
        ];

        for (state, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/api/v3/repos/org/repo/statuses/0123456789abcdef"))
                .and(body_partial_json(serde_json::json!({ "state": expected })))
                .respond_with(ResponseTemplate::new(201))
                .expect(1)
                .mount(&server)
                .await;

            client(&server)
                .set_commit_status(&pre_submit_job(), "hookline/unit", state, "", "")
                .await
                .unwrap();
            server.verify().await;
        }
    }

    #[tokio::test]
    async fn test_register_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/repos/org/repo/hooks"))
            .and(body_partial_json(serde_json::json!({
                "name": "web",
                "active": true,
                "events": ["*"],
                "config": {
                    "url": "https://hooks.example.com/webhook/ci/app",
                    "content_type": "json",
                    "secret": SECRET,
                },
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .register_webhook("https://hooks.example.com/webhook/ci/app")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_and_delete_webhooks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/repos/org/repo/hooks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": 11, "config": { "url": "https://a.example.com" } },
                { "id": 12, "config": { "url": "https://b.example.com" } },
            ])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v3/repos/org/repo/hooks/12"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let hooks = client.list_webhooks().await.unwrap();
        assert_eq!(hooks.len(), 2);
        assert_eq!(hooks[1].id, 12);
        assert_eq!(hooks[1].url, "https://b.example.com");

        client.delete_webhook(12).await.unwrap();
    }

    #[tokio::test]
    async fn test_can_user_write_to_repo() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/repos/org/repo/collaborators/writer/permission"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "permission": "write" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/repos/org/repo/collaborators/reader/permission"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "permission": "read" })),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v3/repos/org/repo/collaborators/owner/permission"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "permission": "admin" })),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let owner = User {
            name: "owner".to_string(),
            ..Default::default()
        };
        let writer = User {
            name: "writer".to_string(),
            ..Default::default()
        };
        let reader = User {
            name: "reader".to_string(),
            ..Default::default()
        };
        assert!(client.can_user_write_to_repo(&owner).await.unwrap());
        assert!(client.can_user_write_to_repo(&writer).await.unwrap());
        assert!(!client.can_user_write_to_repo(&reader).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_user_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "login": "octocat",
                "id": 583231,
                "email": "octocat@github.com",
            })))
            .mount(&server)
            .await;

        let user = client(&server).get_user_info("octocat").await.unwrap();
        assert_eq!(user.id, 583231);
        assert_eq!(user.name, "octocat");
        assert_eq!(user.email.as_deref(), Some("octocat@github.com"));
    }

    #[tokio::test]
    async fn test_register_comment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/repos/org/repo/issues/7/comments"))
            .and(body_partial_json(serde_json::json!({ "body": "Build started" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .register_comment(IssueType::PullRequest, 7, "Build started")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/users/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let result = client(&server).get_user_info("ghost").await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
