//! Job sink abstraction.

use async_trait::async_trait;

use crate::Result;
use crate::run::IntegrationJob;

/// System of record that accepts run requests.
///
/// Implementations enforce name uniqueness and report a duplicate as
/// [`Error::Conflict`](crate::Error::Conflict).
#[async_trait]
pub trait JobSink: Send + Sync {
    /// Name of this sink.
    fn name(&self) -> &'static str;

    /// Persist a run request.
    async fn create(&self, job: &IntegrationJob) -> Result<()>;
}
