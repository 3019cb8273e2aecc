//! Task service
//!
//! Owns the authoritative in-memory collection and the id counter. Every
//! mutation builds a candidate collection, persists it through the
//! [`TaskStorage`], and only then swaps it in. The exclusive lock is held
//! across the whole build → persist → commit sequence, so mutations are
//! totally ordered and readers never see a half-applied change.
//!
//! Cancellation is checked before any lock is taken and again right before
//! storage is called. There is no checkpoint between a successful save and
//! the in-memory commit: once the write has landed, the commit proceeds even
//! if the context fired meanwhile.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::model::{NewTask, Task};
use super::patch::TaskPatch;
use super::storage::TaskStorage;
use crate::{Error, RequestContext, Result};

/// The collection and the counter always change together.
struct Snapshot {
    tasks: Arc<Vec<Task>>,
    next_id: u64,
}

pub struct TaskService {
    storage: Arc<dyn TaskStorage>,
    state: RwLock<Snapshot>,
}

impl TaskService {
    /// Load the collection from `storage` and derive the next id
    pub async fn init(ctx: &RequestContext, storage: Arc<dyn TaskStorage>) -> Result<Self> {
        let tasks = storage.load(ctx).await?;
        let next_id = match tasks.iter().map(|t| t.id).max() {
            Some(max) => max.checked_add(1).ok_or_else(id_space_exhausted)?,
            None => 1,
        };
        tracing::info!("Loaded {} tasks, next id {}", tasks.len(), next_id);

        Ok(Self {
            storage,
            state: RwLock::new(Snapshot {
                tasks: Arc::new(tasks),
                next_id,
            }),
        })
    }

    /// Copy of the current collection.
    ///
    /// `delay` is an artificial, cancellable pause before the read, used to
    /// exercise request timeouts.
    pub async fn list(&self, ctx: &RequestContext, delay: Option<Duration>) -> Result<Vec<Task>> {
        ctx.check()?;
        if let Some(delay) = delay {
            ctx.sleep(delay).await?;
        }
        ctx.check()?;

        let state = self.state.read().await;
        tracing::debug!("Listing {} tasks", state.tasks.len());
        Ok(state.tasks.as_ref().clone())
    }

    /// Look up a task. A missing id is `Ok(None)`, not an error.
    pub async fn get(&self, ctx: &RequestContext, id: u64) -> Result<Option<Task>> {
        ctx.check()?;
        let state = self.state.read().await;
        Ok(state.tasks.iter().find(|t| t.id == id).cloned())
    }

    pub async fn create(&self, ctx: &RequestContext, new: NewTask) -> Result<Task> {
        ctx.check()?;
        new.validate()?;

        let mut state = self.state.write().await;
        let next_id = state.next_id.checked_add(1).ok_or_else(id_space_exhausted)?;
        let created = new.into_task(state.next_id);

        let mut candidate = Vec::with_capacity(state.tasks.len() + 1);
        candidate.extend(state.tasks.iter().cloned());
        candidate.push(created.clone());

        self.persist(ctx, &candidate).await?;

        state.tasks = Arc::new(candidate);
        state.next_id = next_id;
        tracing::info!("Created task {}", created.id);
        Ok(created)
    }

    /// Merge `patch` onto task `id`. A missing id is `Ok(None)` and nothing
    /// is written.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: u64,
        patch: &TaskPatch,
    ) -> Result<Option<Task>> {
        ctx.check()?;
        patch.validate()?;

        let mut state = self.state.write().await;
        let Some(index) = state.tasks.iter().position(|t| t.id == id) else {
            return Ok(None);
        };

        let updated = patch.apply_to(&state.tasks[index]);
        let mut candidate = state.tasks.as_ref().clone();
        candidate[index] = updated.clone();

        self.persist(ctx, &candidate).await?;

        state.tasks = Arc::new(candidate);
        tracing::info!("Updated task {}", id);
        Ok(Some(updated))
    }

    /// Remove task `id`. Returns `false` if it did not exist.
    pub async fn delete(&self, ctx: &RequestContext, id: u64) -> Result<bool> {
        ctx.check()?;

        let mut state = self.state.write().await;
        if !state.tasks.iter().any(|t| t.id == id) {
            return Ok(false);
        }

        let candidate: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.id != id)
            .cloned()
            .collect();

        self.persist(ctx, &candidate).await?;

        state.tasks = Arc::new(candidate);
        tracing::info!("Deleted task {}", id);
        Ok(true)
    }

    /// Id the next created task will receive
    pub async fn next_id(&self) -> u64 {
        self.state.read().await.next_id
    }

    async fn persist(&self, ctx: &RequestContext, candidate: &[Task]) -> Result<()> {
        ctx.check()?;
        self.storage.save(ctx, candidate).await.map_err(|e| {
            if e.is_cancellation() {
                tracing::debug!("Save abandoned: {}", e);
            } else {
                tracing::warn!("Failed to persist tasks: {}", e);
            }
            e
        })
    }
}

fn id_space_exhausted() -> Error {
    Error::validation("task id space exhausted")
}
