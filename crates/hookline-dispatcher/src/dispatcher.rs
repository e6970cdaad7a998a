//! Dispatcher: from canonical webhook to run request.

use async_trait::async_trait;
use hookline_core::git::{EventType, PullRequest, Push, Repository, User, Webhook};
use hookline_core::integration::IntegrationConfig;
use hookline_core::job::JobType;
use hookline_core::run::{
    BaseRefs, ConfigRef, IntegrationJob, IntegrationJobSpec, PullAuthor, PullRefs, Refs, Sender,
};
use hookline_core::{Error, IdSource, JobSink, RandomIdSource, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::filter::filter_jobs;
use crate::identity::generate_meta;
use crate::plugin::Plugin;

/// Turns pull request and push webhooks into `IntegrationJob`s.
///
/// Every dispatch draws a fresh run ID, so redelivering the same webhook
/// produces a new run.
pub struct Dispatcher {
    sink: Arc<dyn JobSink>,
    ids: Arc<dyn IdSource>,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn JobSink>) -> Self {
        Self::with_id_source(sink, Arc::new(RandomIdSource))
    }

    pub fn with_id_source(sink: Arc<dyn JobSink>, ids: Arc<dyn IdSource>) -> Self {
        Self { sink, ids }
    }

    /// Filter the config's jobs for `webhook` and submit one run if any remain.
    ///
    /// Returns the submitted run, or `None` when the event selects nothing.
    pub async fn handle(
        &self,
        webhook: &Webhook,
        config: &IntegrationConfig,
    ) -> Result<Option<IntegrationJob>> {
        if webhook.pull_request.is_none() && webhook.push.is_none() {
            return Err(Error::Configuration(
                "webhook carries neither a pull request nor a push".to_string(),
            ));
        }

        let job = match (webhook.event_type, &webhook.pull_request, &webhook.push) {
            (EventType::PullRequest, Some(pr), _) => {
                if !pr.action.is_triggering() {
                    debug!(config = %config.name, pr = pr.id, action = ?pr.action, "Pull request action does not trigger jobs");
                    return Ok(None);
                }
                self.generate_pre_submit(pr, &webhook.repository, &pr.sender, config)
            }
            (EventType::Push, _, Some(push)) => {
                self.generate_post_submit(push, &webhook.repository, &push.sender, config)
            }
            _ => None,
        };

        let Some(job) = job else {
            debug!(config = %config.name, event = %webhook.event_type, "No jobs selected");
            return Ok(None);
        };

        self.sink.create(&job).await?;
        info!(
            config = %config.name,
            namespace = %config.namespace,
            run = %job.metadata.name,
            run_id = %job.spec.id,
            jobs = job.spec.jobs.len(),
            sink = self.sink.name(),
            "Created integration job"
        );

        Ok(Some(job))
    }

    /// Run request for a pull request, built from the pre-submit pool.
    pub fn generate_pre_submit(
        &self,
        pr: &PullRequest,
        repo: &Repository,
        sender: &User,
        config: &IntegrationConfig,
    ) -> Option<IntegrationJob> {
        let jobs = filter_jobs(
            &config.jobs.pre_submit,
            EventType::PullRequest,
            &pr.base.r#ref,
        );
        if jobs.is_empty() {
            return None;
        }

        let id = self.ids.next_id();
        Some(IntegrationJob {
            metadata: generate_meta(config, &pr.head.sha, &id),
            spec: IntegrationJobSpec {
                config_ref: ConfigRef {
                    name: config.name.clone(),
                    r#type: JobType::PreSubmit,
                },
                id,
                jobs,
                workspaces: config.workspaces.clone(),
                refs: Refs {
                    repository: repo.name.clone(),
                    link: repo.url.clone(),
                    sender: Some(sender_of(sender)),
                    base: BaseRefs {
                        r#ref: pr.base.r#ref.clone(),
                        link: repo.url.clone(),
                        sha: String::new(),
                    },
                    pull: Some(PullRefs {
                        id: pr.id,
                        r#ref: pr.head.r#ref.clone(),
                        sha: pr.head.sha.clone(),
                        link: pr.url.clone(),
                        author: PullAuthor {
                            name: pr.sender.name.clone(),
                        },
                    }),
                },
                pod_template: config.pod_template.clone(),
            },
        })
    }

    /// Run request for a push, built from the post-submit pool.
    pub fn generate_post_submit(
        &self,
        push: &Push,
        repo: &Repository,
        sender: &User,
        config: &IntegrationConfig,
    ) -> Option<IntegrationJob> {
        let jobs = filter_jobs(&config.jobs.post_submit, EventType::Push, &push.r#ref);
        if jobs.is_empty() {
            return None;
        }

        let id = self.ids.next_id();
        Some(IntegrationJob {
            metadata: generate_meta(config, &push.sha, &id),
            spec: IntegrationJobSpec {
                config_ref: ConfigRef {
                    name: config.name.clone(),
                    r#type: JobType::PostSubmit,
                },
                id,
                jobs,
                workspaces: config.workspaces.clone(),
                refs: Refs {
                    repository: repo.name.clone(),
                    link: repo.url.clone(),
                    sender: Some(sender_of(sender)),
                    base: BaseRefs {
                        r#ref: push.r#ref.clone(),
                        link: repo.url.clone(),
                        sha: push.sha.clone(),
                    },
                    pull: None,
                },
                pod_template: config.pod_template.clone(),
            },
        })
    }
}

fn sender_of(user: &User) -> Sender {
    Sender {
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

#[async_trait]
impl Plugin for Dispatcher {
    fn name(&self) -> &'static str {
        "dispatcher"
    }

    fn handles(&self) -> &[EventType] {
        &[EventType::PullRequest, EventType::Push]
    }

    async fn on_webhook(&self, webhook: &Webhook, config: &IntegrationConfig) -> Result<()> {
        self.handle(webhook, config).await.map(|_| ())
    }
}
