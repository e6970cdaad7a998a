//! Offline dispatch of a webhook payload.

use anyhow::{Context, Result};
use hookline_core::git::GitHost;
use hookline_core::integration::IntegrationConfig;
use hookline_core::run::IntegrationJob;
use hookline_dispatcher::Dispatcher;
use hookline_providers::signature::sign_payload;
use hookline_providers::{github, gitlab};
use hookline_sink::InMemorySink;
use http::{HeaderMap, HeaderValue};
use std::path::Path;
use std::sync::Arc;

use super::load_config;

pub async fn run(config_path: &Path, provider_event: &str, payload_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let payload = std::fs::read(payload_path)
        .with_context(|| format!("failed to read {}", payload_path.display()))?;

    match dispatch_payload(&config, provider_event, &payload).await? {
        Outcome::Created(job) => println!("{}", serde_json::to_string_pretty(&job)?),
        Outcome::NothingSelected => println!("No integration job created"),
        Outcome::Unsupported { provider } => {
            println!("Event {:?} is not supported by {}", provider_event, provider)
        }
    }
    Ok(())
}

/// Result of dispatching one payload.
#[derive(Debug)]
pub enum Outcome {
    /// The provider does not canonicalize this event.
    Unsupported { provider: &'static str },
    /// The event selected no jobs.
    NothingSelected,
    Created(IntegrationJob),
}

/// Headers a provider would send with `body`, authenticated with the config's secret.
pub fn signed_headers(
    config: &IntegrationConfig,
    provider_event: &str,
    body: &[u8],
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let event = HeaderValue::from_str(provider_event).context("invalid event name")?;

    match config.git.host {
        GitHost::Github => {
            let signature = sign_payload(&config.webhook_secret, body)?;
            headers.insert(github::EVENT_HEADER, event);
            headers.insert(github::SIGNATURE_HEADER, HeaderValue::from_str(&signature)?);
        }
        GitHost::Gitlab => {
            headers.insert(gitlab::EVENT_HEADER, event);
            headers.insert(
                gitlab::TOKEN_HEADER,
                HeaderValue::from_str(&config.webhook_secret)
                    .context("webhook secret is not a valid header value")?,
            );
        }
    }
    Ok(headers)
}

/// Parse and dispatch `body` into an in-memory sink.
pub async fn dispatch_payload(
    config: &IntegrationConfig,
    provider_event: &str,
    body: &[u8],
) -> Result<Outcome> {
    let headers = signed_headers(config, provider_event, body)?;
    let client = hookline_providers::client_for(config, reqwest::Client::new());

    let Some(webhook) = client.parse_webhook(&headers, body)? else {
        return Ok(Outcome::Unsupported {
            provider: client.name(),
        });
    };

    let dispatcher = Dispatcher::new(Arc::new(InMemorySink::new()));
    Ok(match dispatcher.handle(&webhook, config).await? {
        Some(job) => Outcome::Created(job),
        None => Outcome::NothingSelected,
    })
}
