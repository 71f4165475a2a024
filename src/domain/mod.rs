//! Domain module for task tracking.
//!
//! This module contains the task model, its value objects, and the
//! identity of the user that owns tasks.

pub mod task;
pub mod user;

pub use task::{
    NewTask, OwnerId, StatusFilter, Task, TaskFilter, TaskId, TaskPatch, Timestamp, newest_first,
};
pub use user::UserIdentity;
