//! Partial task updates
//!
//! Every field of a [`TaskPatch`] is either absent (`None`, keep the stored
//! value) or present (`Some`, overwrite it). The task id is not part of the
//! patch; any `id` in a request body is ignored on decode.

use serde::Deserialize;

use super::model::{validate_title, Task, TaskPriority};
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

impl TaskPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn done(mut self, done: bool) -> Self {
        self.done = Some(done);
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Check the present fields only
    pub fn validate(&self) -> Result<()> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }

    /// Merge the present fields onto a copy of `existing`
    pub fn apply_to(&self, existing: &Task) -> Task {
        let mut merged = existing.clone();
        if let Some(title) = &self.title {
            merged.title = title.clone();
        }
        if let Some(done) = self.done {
            merged.done = done;
        }
        if let Some(priority) = self.priority {
            merged.priority = priority;
        }
        merged
    }
}
