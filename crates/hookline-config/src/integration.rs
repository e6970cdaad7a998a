//! Integration config parsing.
//!
//! ```kdl
//! integration "my-service" namespace="ci"
//!
//! git "github" repository="org/my-service" {
//!     token-env "GITHUB_TOKEN"
//! }
//!
//! webhook-secret "s3cr3t"
//!
//! workspace "source" {
//!     pvc "ci-source"
//! }
//!
//! pre-submit {
//!     job "test" {
//!         image "rust:1.85"
//!         run "cargo test"
//!         when {
//!             branch "main" "release-.*"
//!         }
//!     }
//! }
//! ```

use crate::nodes::{
    get_all_string_args, get_first_string_arg, get_string_list_prop, get_string_prop,
};
use crate::{ConfigError, ConfigResult};
use hookline_core::git::GitHost;
use hookline_core::integration::{
    GitConfig, IntegrationConfig, Jobs, PodTemplate, WorkspaceBinding, WorkspaceSource,
};
use hookline_core::job::{Job, Param, TaskRef, When};
use k8s_openapi::api::core::v1::{Container, EnvVar};
use kdl::{KdlDocument, KdlNode};
use regex::Regex;
use std::collections::{HashMap, HashSet};

const DEFAULT_NAMESPACE: &str = "default";

/// Parse an integration config from KDL text.
pub fn parse_integration_config(kdl: &str) -> ConfigResult<IntegrationConfig> {
    let doc: KdlDocument = kdl.parse()?;

    let mut name = String::new();
    let mut namespace = DEFAULT_NAMESPACE.to_string();
    let mut git = None;
    let mut webhook_secret = None;
    let mut jobs = Jobs::default();
    let mut workspaces = Vec::new();
    let mut pod_template = None;

    for node in doc.nodes() {
        match node.name().value() {
            "integration" => {
                name = get_first_string_arg(node)
                    .ok_or_else(|| ConfigError::MissingField("integration name".to_string()))?;
                if let Some(ns) = get_string_prop(node, "namespace") {
                    namespace = ns;
                }
            }
            "git" => {
                git = Some(parse_git(node)?);
            }
            "webhook-secret" => {
                webhook_secret = get_first_string_arg(node);
            }
            "workspace" => {
                workspaces.push(parse_workspace(node)?);
            }
            "pod-template" => {
                pod_template = Some(parse_pod_template(node));
            }
            "pre-submit" => {
                jobs.pre_submit = parse_jobs(node)?;
            }
            "post-submit" => {
                jobs.post_submit = parse_jobs(node)?;
            }
            _ => {} // Ignore unknown nodes
        }
    }

    if name.is_empty() {
        return Err(ConfigError::MissingField("integration name".to_string()));
    }
    let git = git.ok_or_else(|| ConfigError::MissingField("git".to_string()))?;
    let webhook_secret =
        webhook_secret.ok_or_else(|| ConfigError::MissingField("webhook-secret".to_string()))?;

    validate_pool("pre-submit", &jobs.pre_submit)?;
    validate_pool("post-submit", &jobs.post_submit)?;

    Ok(IntegrationConfig {
        name,
        namespace,
        git,
        webhook_secret,
        jobs,
        workspaces,
        pod_template,
    })
}

/// Describe every branch/tag pattern that does not compile.
///
/// Such patterns never match at dispatch time, which is easy to miss, so
/// callers surface these as warnings.
pub fn pattern_warnings(config: &IntegrationConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let pools = [
        ("pre-submit", &config.jobs.pre_submit),
        ("post-submit", &config.jobs.post_submit),
    ];

    for (pool, jobs) in pools {
        for job in jobs.iter() {
            let Some(when) = &job.when else { continue };
            let fields = [
                ("branch", &when.branch),
                ("skip-branch", &when.skip_branch),
                ("tag", &when.tag),
                ("skip-tag", &when.skip_tag),
            ];
            for (field, patterns) in fields {
                for pattern in patterns.iter() {
                    if let Err(e) = Regex::new(pattern) {
                        warnings.push(format!(
                            "{} job '{}': {} pattern '{}' never matches: {}",
                            pool,
                            job.name(),
                            field,
                            pattern,
                            e
                        ));
                    }
                }
            }
        }
    }

    warnings
}

fn parse_git(node: &KdlNode) -> ConfigResult<GitConfig> {
    let host_name =
        get_first_string_arg(node).ok_or_else(|| ConfigError::MissingField("git host".to_string()))?;
    let host: GitHost = host_name.parse().map_err(|message| ConfigError::InvalidValue {
        field: "git host".to_string(),
        message,
    })?;

    let repository = get_string_prop(node, "repository")
        .ok_or_else(|| ConfigError::MissingField("git repository".to_string()))?;
    let server_url = get_string_prop(node, "server-url");

    let mut token = None;
    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "token" => {
                    token = get_first_string_arg(child);
                }
                "token-env" => {
                    let var = get_first_string_arg(child)
                        .ok_or_else(|| ConfigError::MissingField("token-env name".to_string()))?;
                    let value = std::env::var(&var).map_err(|e| ConfigError::InvalidValue {
                        field: "token-env".to_string(),
                        message: format!("{}: {}", var, e),
                    })?;
                    token = Some(value);
                }
                _ => {}
            }
        }
    }

    Ok(GitConfig {
        host,
        repository,
        server_url,
        token,
    })
}

fn parse_workspace(node: &KdlNode) -> ConfigResult<WorkspaceBinding> {
    let name = get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField("workspace name".to_string()))?;

    let source_node = node
        .children()
        .and_then(|c| c.nodes().first())
        .ok_or_else(|| ConfigError::MissingField(format!("source for workspace '{}'", name)))?;

    let arg = || {
        get_first_string_arg(source_node).ok_or_else(|| {
            ConfigError::MissingField(format!(
                "{} for workspace '{}'",
                source_node.name().value(),
                name
            ))
        })
    };

    let source = match source_node.name().value() {
        "empty-dir" => WorkspaceSource::EmptyDir {},
        "pvc" => WorkspaceSource::PersistentVolumeClaim { claim_name: arg()? },
        "config-map" => WorkspaceSource::ConfigMap { name: arg()? },
        "secret" => WorkspaceSource::Secret { secret_name: arg()? },
        other => {
            return Err(ConfigError::InvalidValue {
                field: format!("workspace '{}'", name),
                message: format!("unknown workspace source: {}", other),
            });
        }
    };

    Ok(WorkspaceBinding { name, source })
}

fn parse_pod_template(node: &KdlNode) -> PodTemplate {
    let mut template = PodTemplate::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "service-account" => {
                    template.service_account_name = get_first_string_arg(child);
                }
                "node-selector" => {
                    let args = get_all_string_args(child);
                    if let [key, value] = args.as_slice() {
                        template.node_selector.insert(key.clone(), value.clone());
                    }
                }
                "image-pull-secret" => {
                    template.image_pull_secrets.extend(get_all_string_args(child));
                }
                _ => {}
            }
        }
    }

    template
}

fn parse_jobs(node: &KdlNode) -> ConfigResult<Vec<Job>> {
    let mut jobs = Vec::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "job" {
                jobs.push(parse_job(child)?);
            }
        }
    }
    Ok(jobs)
}

fn parse_job(node: &KdlNode) -> ConfigResult<Job> {
    let name =
        get_first_string_arg(node).ok_or_else(|| ConfigError::MissingField("job name".to_string()))?;
    let after = get_string_list_prop(node, "after");

    let mut image = None;
    let mut command = Vec::new();
    let mut args = Vec::new();
    let mut scripts = Vec::new();
    let mut working_dir = None;
    let mut env = Vec::new();
    let mut task = None;
    let mut when = None;

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "image" => {
                    image = get_first_string_arg(child);
                }
                "command" => {
                    command = get_all_string_args(child);
                }
                "args" => {
                    args = get_all_string_args(child);
                }
                "run" => {
                    if let Some(line) = get_first_string_arg(child) {
                        scripts.push(line);
                    }
                }
                "working-dir" => {
                    working_dir = get_first_string_arg(child);
                }
                "env" => {
                    let pair = get_all_string_args(child);
                    if let [key, value] = pair.as_slice() {
                        env.push(EnvVar {
                            name: key.clone(),
                            value: Some(value.clone()),
                            ..Default::default()
                        });
                    }
                }
                "task" => {
                    task = Some(parse_task(child));
                }
                "when" => {
                    when = Some(parse_when(child));
                }
                _ => {}
            }
        }
    }

    if image.is_none() && task.is_none() {
        return Err(ConfigError::MissingField(format!(
            "image or task for job '{}'",
            name
        )));
    }

    if !scripts.is_empty() {
        if !command.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("job '{}'", name),
                message: "run and command are mutually exclusive".to_string(),
            });
        }
        command = vec!["/bin/sh".to_string(), "-c".to_string(), scripts.join("\n")];
    }

    let container = Container {
        name,
        image,
        command: (!command.is_empty()).then_some(command),
        args: (!args.is_empty()).then_some(args),
        working_dir,
        env: (!env.is_empty()).then_some(env),
        ..Default::default()
    };

    Ok(Job {
        container,
        task,
        when,
        after,
    })
}

fn parse_task(node: &KdlNode) -> TaskRef {
    let mut params = Vec::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "param" {
                let pair = get_all_string_args(child);
                if let [name, value] = pair.as_slice() {
                    params.push(Param {
                        name: name.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
    }

    TaskRef {
        name: get_string_prop(node, "name"),
        catalog: get_string_prop(node, "catalog"),
        params,
    }
}

fn parse_when(node: &KdlNode) -> When {
    let mut when = When::default();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            let target = match child.name().value() {
                "branch" => &mut when.branch,
                "skip-branch" => &mut when.skip_branch,
                "tag" => &mut when.tag,
                "skip-tag" => &mut when.skip_tag,
                "ref" => &mut when.r#ref,
                "skip-ref" => &mut when.skip_ref,
                _ => continue,
            };
            target.extend(get_all_string_args(child));
        }
    }
    when
}

/// Check names are unique and `after` edges resolve to an acyclic graph.
fn validate_pool(pool: &str, jobs: &[Job]) -> ConfigResult<()> {
    let mut names = HashSet::new();
    for job in jobs {
        if !names.insert(job.name()) {
            return Err(ConfigError::Duplicate(format!(
                "{} job '{}'",
                pool,
                job.name()
            )));
        }
    }

    for job in jobs {
        for dep in &job.after {
            if !names.contains(dep.as_str()) {
                return Err(ConfigError::InvalidReference(format!(
                    "{} job '{}' runs after unknown job '{}'",
                    pool,
                    job.name(),
                    dep
                )));
            }
        }
    }

    if let Err(cycle) = detect_cycle(jobs) {
        return Err(ConfigError::CycleDetected(cycle));
    }

    Ok(())
}

/// Detect cycles in the `after` graph using DFS.
fn detect_cycle(jobs: &[Job]) -> Result<(), String> {
    let mut visited = HashMap::new();
    let mut rec_stack = HashMap::new();

    let job_map: HashMap<&str, &Job> = jobs.iter().map(|j| (j.name(), j)).collect();

    for job in jobs {
        if !visited.contains_key(job.name()) {
            if let Some(cycle) = dfs_detect_cycle(job.name(), &job_map, &mut visited, &mut rec_stack)
            {
                return Err(cycle);
            }
        }
    }
    Ok(())
}

fn dfs_detect_cycle<'a>(
    node: &'a str,
    job_map: &'a HashMap<&'a str, &'a Job>,
    visited: &mut HashMap<&'a str, bool>,
    rec_stack: &mut HashMap<&'a str, bool>,
) -> Option<String> {
    visited.insert(node, true);
    rec_stack.insert(node, true);

    if let Some(job) = job_map.get(node) {
        for dep in &job.after {
            let dep_str: &'a str = dep.as_str();
            if !visited.contains_key(dep_str) {
                if let Some(cycle) = dfs_detect_cycle(dep_str, job_map, visited, rec_stack) {
                    return Some(cycle);
                }
            } else if rec_stack.get(dep_str).copied().unwrap_or(false) {
                return Some(format!("{} -> {}", node, dep));
            }
        }
    }

    rec_stack.insert(node, false);
    None
}
