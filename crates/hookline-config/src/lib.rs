//! KDL configuration parsing for Hookline.
//!
//! This crate handles parsing of:
//! - Integration configs (one repository, its job pools and run settings)
//! - Server configuration
//! - Loading a directory of integration configs into a store

pub mod error;
pub mod integration;
mod nodes;
pub mod store;
pub mod system;

pub use error::{ConfigError, ConfigResult};
pub use integration::{parse_integration_config, pattern_warnings};
pub use store::ConfigStore;
pub use system::{ServerConfig, SinkBackend, parse_server_config};
