//! Core library for the task manager service
//!
//! This crate contains the storage and business logic, including:
//! - Request-scoped cancellation (`context`)
//! - Task model, partial updates and validation
//! - JSON file persistence and the task service

pub mod context;
pub mod error;
pub mod task;

pub use context::RequestContext;
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
