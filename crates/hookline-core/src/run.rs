//! Run requests handed to a job sink.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::id::RunId;
use crate::integration::{PodTemplate, WorkspaceBinding};
use crate::job::{Job, JobType};

/// API group of the `IntegrationJob` resource.
pub const GROUP: &str = "cicd.hookline.dev";
/// API version of the `IntegrationJob` resource.
pub const VERSION: &str = "v1";
pub const KIND: &str = "IntegrationJob";

/// Label carrying the name of the originating config.
pub const LABEL_CONFIG: &str = "hookline.dev/integration-config";
/// Label carrying the run ID.
pub const LABEL_RUN_ID: &str = "hookline.dev/run-id";

/// Object metadata of a run request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMeta {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
}

/// A request to execute a filtered set of jobs for one triggering event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationJob {
    pub metadata: RunMeta,
    pub spec: IntegrationJobSpec,
}

impl IntegrationJob {
    pub fn job_type(&self) -> JobType {
        self.spec.config_ref.r#type
    }

    /// Commit the run reports statuses against: the pull request head when
    /// present, the pushed commit otherwise.
    pub fn status_sha(&self) -> &str {
        match &self.spec.refs.pull {
            Some(pull) => &pull.sha,
            None => &self.spec.refs.base.sha,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationJobSpec {
    pub config_ref: ConfigRef,
    pub id: RunId,
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub workspaces: Vec<WorkspaceBinding>,
    pub refs: Refs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<PodTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRef {
    pub name: String,
    pub r#type: JobType,
}

/// Git coordinates of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refs {
    pub repository: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Sender>,
    pub base: BaseRefs,
    /// Present only for pre-submit runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull: Option<PullRefs>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRefs {
    pub r#ref: String,
    pub link: String,
    #[serde(default)]
    pub sha: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRefs {
    pub id: u64,
    pub r#ref: String,
    pub sha: String,
    pub link: String,
    pub author: PullAuthor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullAuthor {
    pub name: String,
}
