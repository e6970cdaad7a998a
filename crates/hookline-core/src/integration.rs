//! Integration configuration: which repository to watch and what to run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::git::GitHost;
use crate::job::Job;

const GITHUB_SERVER: &str = "https://github.com";
const GITHUB_API: &str = "https://api.github.com";
const GITLAB_SERVER: &str = "https://gitlab.com";

/// A complete integration config for one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationConfig {
    pub name: String,
    pub namespace: String,
    pub git: GitConfig,
    /// Shared secret used to authenticate inbound webhooks.
    pub webhook_secret: String,
    pub jobs: Jobs,
    #[serde(default)]
    pub workspaces: Vec<WorkspaceBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<PodTemplate>,
}

impl IntegrationConfig {
    /// A config with no jobs, workspaces or pod template.
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        git: GitConfig,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            git,
            webhook_secret: webhook_secret.into(),
            jobs: Jobs::default(),
            workspaces: Vec::new(),
            pod_template: None,
        }
    }
}

/// Git host connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitConfig {
    pub host: GitHost,
    /// Repository identifier, e.g. `org/project`.
    pub repository: String,
    /// Web URL of the git server. Defaults to the public host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    /// API token for outbound calls.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl GitConfig {
    /// Base URL of the REST API.
    ///
    /// GitHub's public server is served from `api.github.com`; GitHub
    /// Enterprise serves it under `/api/v3`. GitLab exposes the API on the
    /// server itself and callers append `/api/v4`.
    pub fn api_url(&self) -> String {
        let server = self.server_url.as_deref().map(|s| s.trim_end_matches('/'));
        match (self.host, server) {
            (GitHost::Github, None) => GITHUB_API.to_string(),
            (GitHost::Github, Some(GITHUB_SERVER)) => GITHUB_API.to_string(),
            (GitHost::Github, Some(url)) => format!("{}/api/v3", url),
            (GitHost::Gitlab, None) => GITLAB_SERVER.to_string(),
            (GitHost::Gitlab, Some(url)) => url.to_string(),
        }
    }
}

/// The two job pools of a config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Jobs {
    /// Considered for pull request events only.
    #[serde(default)]
    pub pre_submit: Vec<Job>,
    /// Considered for push events only.
    #[serde(default)]
    pub post_submit: Vec<Job>,
}

/// A named volume shared between the jobs of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceBinding {
    pub name: String,
    #[serde(flatten)]
    pub source: WorkspaceSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkspaceSource {
    EmptyDir {},
    PersistentVolumeClaim {
        #[serde(rename = "claimName")]
        claim_name: String,
    },
    ConfigMap {
        name: String,
    },
    Secret {
        #[serde(rename = "secretName")]
        secret_name: String,
    },
}

/// Pod-level settings applied to every job of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_pull_secrets: Vec<String>,
}
