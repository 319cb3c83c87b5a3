//! Retrieval of pipeline execution records.
//!
//! The guard loop only knows the [`ExecutionLister`] trait; [`GitLabLister`]
//! is the HTTP implementation used by the binary.

mod gitlab;

use async_trait::async_trait;

use crate::core::ExecutionRecord;
use crate::errors::ApiAccessError;

pub use gitlab::{GitLabLister, DEFAULT_PER_PAGE, REQUEST_TIMEOUT};

/// Fetches the current pipeline executions of one project.
///
/// Implementations make a single attempt per call; retrying is the guard
/// loop's job. Records come back in service order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionLister: Send + Sync {
    /// Lists the project's pipeline executions.
    async fn list_executions(&self) -> Result<Vec<ExecutionRecord>, ApiAccessError>;
}
