//! File-based task storage implementation
//!
//! Stores the task collection as pretty-printed JSON in a single file.
//! Reads take a shared lock, writes an exclusive one, and every step that
//! may block is bracketed by a context checkpoint.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::model::Task;
use super::storage::TaskStorage;
use crate::{RequestContext, Result};

/// File-based task store using JSON
pub struct FileTaskStore {
    /// Path to the JSON file
    path: PathBuf,
    /// Guards file access within this process
    lock: RwLock<()>,
}

impl FileTaskStore {
    /// Create a new FileTaskStore
    ///
    /// Nothing is read here; the file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TaskStorage for FileTaskStore {
    async fn load(&self, ctx: &RequestContext) -> Result<Vec<Task>> {
        ctx.check()?;
        let _guard = self.lock.read().await;
        ctx.check()?;

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Task file {:?} does not exist yet", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        ctx.check()?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tasks: Vec<Task> = serde_json::from_str(&content)?;
        ctx.check()?;

        Ok(tasks)
    }

    async fn save(&self, ctx: &RequestContext, tasks: &[Task]) -> Result<()> {
        ctx.check()?;
        let _guard = self.lock.write().await;
        ctx.check()?;

        let content = serde_json::to_string_pretty(tasks)?;
        ctx.check()?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Past the last checkpoint the write is not rolled back.
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}
