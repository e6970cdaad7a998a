//! Branch and tag filtering of job pools.
//!
//! A pool is narrowed in two passes, tags first and branches second. Each pass
//! looks at one include list, one skip list and the incoming name:
//!
//! | `when` | include | skip | incoming | result |
//! |---|---|---|---|---|
//! | absent | - | - | - | keep |
//! | set | empty | empty | - | keep |
//! | set | any | any | empty | drop |
//! | set | set | empty | set | keep if any pattern matches |
//! | set | empty | set | set | keep if no pattern matches |
//! | set | set | set | set | drop |
//!
//! Patterns are regular expressions matched anywhere in the name. A pattern
//! that fails to compile matches nothing.

use hookline_core::git::EventType;
use hookline_core::job::{Job, When};
use regex::Regex;
use tracing::debug;

const TAG_PREFIX: &str = "refs/tags/";
const BRANCH_PREFIX: &str = "refs/heads/";

/// Branch or tag named by an incoming ref. Empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingRef {
    pub branch: String,
    pub tag: String,
}

impl IncomingRef {
    /// Classify `r#ref` for an event.
    ///
    /// Pull requests pass their base branch name and never carry a tag.
    /// Pushes pass the raw ref.
    pub fn classify(event_type: EventType, r#ref: &str) -> Self {
        match event_type {
            EventType::Push if r#ref.contains(TAG_PREFIX) => Self {
                branch: String::new(),
                tag: r#ref.replace(TAG_PREFIX, ""),
            },
            EventType::Push => Self {
                branch: r#ref.replace(BRANCH_PREFIX, ""),
                tag: String::new(),
            },
            _ => Self {
                branch: r#ref.to_string(),
                tag: String::new(),
            },
        }
    }
}

/// Jobs of `candidates` that should run for an event on `r#ref`, in input order.
pub fn filter_jobs(candidates: &[Job], event_type: EventType, r#ref: &str) -> Vec<Job> {
    let incoming = IncomingRef::classify(event_type, r#ref);

    let tagged = narrow(candidates.iter(), &incoming.tag, |w| (&w.tag, &w.skip_tag));
    narrow(tagged, &incoming.branch, |w| (&w.branch, &w.skip_branch))
        .cloned()
        .collect()
}

fn narrow<'a, I, F>(jobs: I, incoming: &'a str, rules: F) -> impl Iterator<Item = &'a Job> + 'a
where
    I: Iterator<Item = &'a Job> + 'a,
    F: Fn(&'a When) -> (&'a Vec<String>, &'a Vec<String>) + 'a,
{
    jobs.filter(move |job: &&'a Job| {
        let job: &'a Job = *job;
        match &job.when {
            None => true,
            Some(when) => {
                let (include, skip) = rules(when);
                survives(include, skip, incoming)
            }
        }
    })
}

fn survives(include: &[String], skip: &[String], incoming: &str) -> bool {
    match (include.is_empty(), skip.is_empty()) {
        (true, true) => true,
        _ if incoming.is_empty() => false,
        (false, true) => include.iter().any(|p| matches(p, incoming)),
        (true, false) => !skip.iter().any(|p| matches(p, incoming)),
        (false, false) => false,
    }
}

fn matches(pattern: &str, incoming: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(incoming),
        Err(e) => {
            debug!(pattern, error = %e, "Ignoring malformed pattern");
            false
        }
    }
}
