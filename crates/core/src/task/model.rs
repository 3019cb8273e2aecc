//! Task model definitions

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Upper bound on a title, counted in characters
pub const MAX_TITLE_LEN: usize = 100;

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

/// A stored task.
///
/// The field order is the on-disk order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub priority: TaskPriority,
}

impl Task {
    /// Create a task with the given id and title
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            done: false,
            priority: TaskPriority::default(),
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the done flag
    pub fn with_done(mut self, done: bool) -> Self {
        self.done = done;
        self
    }
}

/// Fields supplied when creating a task. The id is assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub done: bool,
    pub priority: TaskPriority,
}

impl NewTask {
    pub fn new(title: impl Into<String>, priority: TaskPriority) -> Self {
        Self {
            title: title.into(),
            done: false,
            priority,
        }
    }

    pub fn with_done(mut self, done: bool) -> Self {
        self.done = done;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)
    }

    pub(crate) fn into_task(self, id: u64) -> Task {
        Task {
            id,
            title: self.title,
            done: self.done,
            priority: self.priority,
        }
    }
}

pub(crate) fn validate_title(title: &str) -> Result<()> {
    if title.is_empty() {
        return Err(Error::validation("Title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task() {
        let task = Task::new(1, "Test task");
        assert_eq!(task.id, 1);
        assert_eq!(task.title, "Test task");
        assert!(!task.done);
        assert_eq!(task.priority, TaskPriority::Medium);
    }

    #[test]
    fn test_task_with_priority() {
        let task = Task::new(1, "Test task").with_priority(TaskPriority::High);
        assert_eq!(task.priority, TaskPriority::High);
    }

    #[test]
    fn test_serialized_field_order() {
        let task = Task::new(7, "Buy milk").with_priority(TaskPriority::Low);
        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(
            json,
            r#"{"id":7,"title":"Buy milk","done":false,"priority":"low"}"#
        );
    }

    #[test]
    fn test_new_task_decodes_with_default_done() {
        let new: NewTask =
            serde_json::from_str(r#"{"title":"Buy milk","priority":"low"}"#).unwrap();
        assert_eq!(new, NewTask::new("Buy milk", TaskPriority::Low));
    }

    #[test]
    fn test_new_task_rejects_unknown_priority() {
        let result = serde_json::from_str::<NewTask>(r#"{"title":"x","priority":"urgent"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_task_requires_priority() {
        let result = serde_json::from_str::<NewTask>(r#"{"title":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_title_validation() {
        assert!(NewTask::new("ok", TaskPriority::Low).validate().is_ok());
        assert!(NewTask::new("", TaskPriority::Low).validate().is_err());
        assert!(NewTask::new("   ", TaskPriority::Low).validate().is_ok());

        let at_limit = "é".repeat(MAX_TITLE_LEN);
        assert!(NewTask::new(at_limit, TaskPriority::Low).validate().is_ok());

        let too_long = "a".repeat(MAX_TITLE_LEN + 1);
        match NewTask::new(too_long, TaskPriority::Low).validate() {
            Err(Error::Validation(msg)) => assert!(msg.contains("100")),
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }
}
