//! Webhook endpoint for git providers.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/{namespace}/{config}", post(receive_webhook))
}

/// Handle a delivery for the integration config `namespace/config`.
async fn receive_webhook(
    State(state): State<AppState>,
    Path((namespace, config)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let span = info_span!(
        "webhook",
        request_id = %Uuid::new_v4(),
        namespace = %namespace,
        config = %config,
    );
    process_webhook(state, namespace, config, headers, body)
        .instrument(span)
        .await
}

async fn process_webhook(
    state: AppState,
    namespace: String,
    name: String,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let Some(config) = state.configs.get(&namespace, &name) else {
        warn!("Unknown integration config");
        return Err(ApiError::BadRequest(format!(
            "cannot get integration config {}/{}",
            namespace, name
        )));
    };

    let client = hookline_providers::client_for(config, state.http.clone());
    let webhook = match client.parse_webhook(&headers, &body) {
        Ok(Some(webhook)) => webhook,
        Ok(None) => {
            info!(provider = client.name(), "Ignoring unsupported event");
            return Ok(StatusCode::OK);
        }
        Err(e) => {
            warn!(provider = client.name(), error = %e, "Rejected webhook");
            return Err(e.into());
        }
    };

    info!(
        provider = client.name(),
        event = %webhook.event_type,
        repository = %webhook.repository.name,
        sender = %webhook.sender.name,
        "Received webhook"
    );

    let report = state.plugins.run(&webhook, config).await;
    info!(ran = report.ran, failed = report.failed, "Plugins finished");

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use crate::AppState;
    use crate::routes::router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use hookline_config::{ConfigStore, parse_integration_config};
    use hookline_providers::signature::sign_payload;
    use hookline_sink::InMemorySink;
    use std::sync::Arc;
    use tower::ServiceExt;

    const GITHUB_CONFIG: &str = r#"
        integration "app" namespace="ci"
        git "github" repository="org/repo"
        webhook-secret "s3cret"

        pre-submit {
            job "lint" {
                image "alpine"
                run "make lint"
            }
        }

        post-submit {
            job "build" {
                image "alpine"
                run "make"
                when {
                    branch "main"
                }
            }
        }
    "#;

    const GITLAB_CONFIG: &str = r#"
        integration "svc" namespace="ci"
        git "gitlab" repository="group/svc"
        webhook-secret "gl-token"

        post-submit {
            job "release" {
                image "alpine"
                run "make release"
                when {
                    tag "v.*"
                }
            }
        }
    "#;

    const GITHUB_PUSH: &str = r#"{
        "ref": "refs/heads/main",
        "after": "fedcba9876543210fedcba9876543210fedcba98",
        "repository": { "full_name": "org/repo", "html_url": "https://github.com/org/repo" },
        "sender": { "login": "octocat", "id": 1 }
    }"#;

    const GITLAB_TAG_PUSH: &str = r#"{
        "object_kind": "tag_push",
        "ref": "refs/tags/v1.0.0",
        "after": "82b3d5ae55f7080f1e6022629cdb57bfae7cccc7",
        "user_id": 1,
        "user_username": "root",
        "project": {
            "path_with_namespace": "group/svc",
            "web_url": "https://gitlab.com/group/svc"
        }
    }"#;

    fn app() -> (axum::Router, Arc<InMemorySink>) {
        let mut configs = ConfigStore::new();
        configs
            .insert(parse_integration_config(GITHUB_CONFIG).unwrap())
            .unwrap();
        configs
            .insert(parse_integration_config(GITLAB_CONFIG).unwrap())
            .unwrap();

        let sink = Arc::new(InMemorySink::new());
        let state = AppState::new(configs, sink.clone(), reqwest::Client::new());
        (router(state), sink)
    }

    fn github_request(path: &str, event: &str, body: &str, signature: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .header("x-github-event", event)
            .header("x-hub-signature", signature)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_signed_push_creates_run() {
        let (app, sink) = app();
        let signature = sign_payload("s3cret", GITHUB_PUSH.as_bytes()).unwrap();

        let response = app
            .oneshot(github_request("/webhook/ci/app", "push", GITHUB_PUSH, &signature))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let jobs = sink.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].metadata.namespace, "ci");
        assert!(jobs[0].metadata.name.starts_with("app-fedcb-"));
        assert_eq!(jobs[0].spec.jobs[0].name(), "build");
    }

    #[tokio::test]
    async fn test_bad_signature_is_unauthorized() {
        let (app, sink) = app();
        let signature = sign_payload("wrong", GITHUB_PUSH.as_bytes()).unwrap();

        let response = app
            .oneshot(github_request("/webhook/ci/app", "push", GITHUB_PUSH, &signature))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_config_is_bad_request() {
        let (app, _) = app();
        let signature = sign_payload("s3cret", GITHUB_PUSH.as_bytes()).unwrap();

        let response = app
            .oneshot(github_request("/webhook/ci/missing", "push", GITHUB_PUSH, &signature))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_event_is_ok() {
        let (app, sink) = app();
        let body = r#"{"zen": "Design for failure."}"#;
        let signature = sign_payload("s3cret", body.as_bytes()).unwrap();

        let response = app
            .oneshot(github_request("/webhook/ci/app", "ping", body, &signature))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_push_to_unmatched_branch_creates_nothing() {
        let (app, sink) = app();
        let body = GITHUB_PUSH.replace("refs/heads/main", "refs/heads/dev");
        let signature = sign_payload("s3cret", body.as_bytes()).unwrap();

        let response = app
            .oneshot(github_request("/webhook/ci/app", "push", &body, &signature))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_gitlab_tag_push() {
        let (app, sink) = app();
        let request = Request::builder()
            .method("POST")
            .uri("/webhook/ci/svc")
            .header("x-gitlab-event", "Tag Push Hook")
            .header("x-gitlab-token", "gl-token")
            .body(Body::from(GITLAB_TAG_PUSH))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let jobs = sink.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].spec.refs.base.r#ref, "refs/tags/v1.0.0");
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
