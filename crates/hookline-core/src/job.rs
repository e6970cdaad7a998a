//! Declarative job definitions.

use k8s_openapi::api::core::v1::Container;
use serde::{Deserialize, Serialize};

/// Which pool a run was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "preSubmit")]
    PreSubmit,
    #[serde(rename = "postSubmit")]
    PostSubmit,
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::PreSubmit => write!(f, "preSubmit"),
            JobType::PostSubmit => write!(f, "postSubmit"),
        }
    }
}

/// A single job in an integration config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Container to run. Its name is the job name.
    #[serde(flatten)]
    pub container: Container,

    /// Refers to a local task or a catalog task instead of inline steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskRef>,

    /// Condition for running the job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<When>,

    /// Jobs that must finish before this one starts.
    #[serde(default)]
    pub after: Vec<String>,
}

impl Job {
    pub fn name(&self) -> &str {
        &self.container.name
    }
}

/// Reference to a reusable task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    /// Name of a task in the local cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Catalog entry, e.g. `s2i@0.2`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default)]
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

/// Branch/tag inclusion and exclusion rules. Empty lists impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct When {
    #[serde(default)]
    pub branch: Vec<String>,
    #[serde(default)]
    pub skip_branch: Vec<String>,
    #[serde(default)]
    pub tag: Vec<String>,
    #[serde(default)]
    pub skip_tag: Vec<String>,
    #[serde(default)]
    pub r#ref: Vec<String>,
    #[serde(default)]
    pub skip_ref: Vec<String>,
}
