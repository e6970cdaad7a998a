//! Job filtering and dispatch for Hookline.
//!
//! Turns a canonical webhook into at most one `IntegrationJob`:
//! the filter engine narrows a config's job pool by branch and tag rules,
//! and the dispatcher names the run and hands it to a job sink.

pub mod dispatcher;
pub mod filter;
pub mod identity;
pub mod plugin;

pub use dispatcher::Dispatcher;
pub use filter::{IncomingRef, filter_jobs};
pub use identity::{generate_meta, run_name};
pub use plugin::{Plugin, PluginRegistry, PluginReport};
