//! Task module
//!
//! This module contains task-related types and logic.

mod file_store;
mod model;
mod patch;
mod service;
mod storage;

pub use file_store::FileTaskStore;
pub use model::*;
pub use patch::TaskPatch;
pub use service::TaskService;
pub use storage::TaskStorage;
