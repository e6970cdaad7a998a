//! Job sinks for Hookline.
//!
//! - [`KubernetesSink`] creates `IntegrationJob` custom resources
//! - [`InMemorySink`] keeps jobs in process memory

pub mod kubernetes;
pub mod memory;

pub use kubernetes::KubernetesSink;
pub use memory::InMemorySink;
