//! Core domain types and traits for Hookline.
//!
//! This crate contains:
//! - The canonical webhook model shared by every git provider
//! - Job and integration configuration types
//! - The run request (`IntegrationJob`) handed to a job sink
//! - The `GitClient`, `JobSink` and `IdSource` seams
//! - The error taxonomy

pub mod error;
pub mod git;
pub mod id;
pub mod integration;
pub mod job;
pub mod provider;
pub mod run;
pub mod sink;

pub use error::{Error, Result};
pub use id::{IdSource, RandomIdSource, RunId};
pub use provider::GitClient;
pub use sink::JobSink;
