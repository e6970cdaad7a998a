//! CLI command implementations.

pub mod dispatch;
pub mod webhooks;

use anyhow::{Context, Result};
use clap::ValueEnum;
use hookline_config::{parse_integration_config, pattern_warnings};
use hookline_core::git::EventType;
use hookline_core::integration::IntegrationConfig;
use hookline_dispatcher::filter_jobs;
use std::path::Path;

/// Events that select jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventKind {
    Push,
    PullRequest,
}

impl From<EventKind> for EventType {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Push => EventType::Push,
            EventKind::PullRequest => EventType::PullRequest,
        }
    }
}

pub fn load_config(path: &Path) -> Result<IntegrationConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_integration_config(&content)
        .with_context(|| format!("invalid integration config {}", path.display()))
}

pub fn validate(path: &Path) -> Result<()> {
    let config = load_config(path)?;

    for warning in pattern_warnings(&config) {
        println!("warning: {}", warning);
    }
    println!(
        "Configuration is valid: {}/{} ({} pre-submit, {} post-submit jobs)",
        config.namespace,
        config.name,
        config.jobs.pre_submit.len(),
        config.jobs.post_submit.len()
    );
    Ok(())
}

pub fn filter(path: &Path, event: EventKind, git_ref: &str) -> Result<()> {
    let config = load_config(path)?;
    let pool = match event {
        EventKind::Push => &config.jobs.post_submit,
        EventKind::PullRequest => &config.jobs.pre_submit,
    };

    let selected = filter_jobs(pool, event.into(), git_ref);
    if selected.is_empty() {
        println!("No jobs selected");
        return Ok(());
    }
    for job in &selected {
        println!("{}", job.name());
    }
    Ok(())
}
