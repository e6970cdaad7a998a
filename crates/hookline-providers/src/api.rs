//! Shared REST plumbing for provider adapters.

use crate::GitError;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

const USER_AGENT: &str = "Hookline";

/// Authenticated REST client bound to one git host.
#[derive(Clone)]
pub(crate) struct ApiClient {
    client: reqwest::Client,
    headers: HeaderMap,
}

impl ApiClient {
    /// `auth` is the host-specific token header, e.g. `("authorization", "token abc")`.
    /// Header names must be lowercase.
    pub(crate) fn new(
        client: reqwest::Client,
        auth: Option<(&'static str, String)>,
        extra: &[(&'static str, &'static str)],
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        for (name, value) in extra {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        if let Some((name, token)) = auth {
            // Tokens with control characters cannot be sent; calls then go
            // out unauthenticated and the host answers 401.
            if let Ok(mut value) = HeaderValue::from_str(&token) {
                value.set_sensitive(true);
                headers.insert(HeaderName::from_static(name), value);
            }
        }
        Self { client, headers }
    }

    /// Send a request and return the response body of a 2xx answer.
    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<String, GitError> {
        let mut request = self
            .client
            .request(method, url)
            .headers(self.headers.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GitError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GitError::Request(format!("failed to read response body: {}", e)))?;
        if !status.is_success() {
            return Err(GitError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(text)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GitError> {
        let text = self.send::<()>(Method::GET, url, None).await?;
        serde_json::from_str(&text).map_err(|e| GitError::Parse(e.to_string()))
    }

    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<(), GitError> {
        self.send(Method::POST, url, Some(body)).await.map(|_| ())
    }

    pub(crate) async fn delete(&self, url: &str) -> Result<(), GitError> {
        self.send::<()>(Method::DELETE, url, None)
            .await
            .map(|_| ())
    }
}

/// Value of a request header, if present and valid UTF-8.
pub(crate) fn header<'a>(headers: &'a http::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
