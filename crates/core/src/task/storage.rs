//! Task storage trait
//!
//! Defines the persistence contract used by the task service. A storage
//! reads and writes the whole collection at once.

use async_trait::async_trait;

use super::model::Task;
use crate::{RequestContext, Result};

/// Whole-collection persistence for tasks
#[async_trait]
pub trait TaskStorage: Send + Sync {
    /// Load the full collection. A missing or blank backing store yields an
    /// empty collection.
    async fn load(&self, ctx: &RequestContext) -> Result<Vec<Task>>;

    /// Replace the persisted collection with `tasks`
    async fn save(&self, ctx: &RequestContext, tasks: &[Task]) -> Result<()>;
}
