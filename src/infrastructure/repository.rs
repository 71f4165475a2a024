//! Repository trait for tasks.
//!
//! Every operation is scoped by the caller's [`OwnerId`]. Implementations
//! must apply the owner as an equality predicate in the same statement that
//! reads or writes the row, so a task owned by someone else behaves exactly
//! like a task that does not exist.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{NewTask, OwnerId, Task, TaskId, TaskPatch};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No row matched both the id and the owner.
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The storage call did not finish in time.
    #[error("Storage call timed out after {0} ms")]
    Timeout(u64),
}

// =============================================================================
// Task Repository
// =============================================================================

/// Repository trait for [`Task`] entities.
///
/// Methods return boxed futures so the repository can be held as
/// `Arc<dyn TaskRepository>` and selected at runtime.
pub trait TaskRepository: Send + Sync {
    /// Lists the owner's tasks, newest first.
    fn list(&self, owner: &OwnerId) -> BoxFuture<'static, Result<Vec<Task>, RepositoryError>>;

    /// Inserts a task for the owner. The store assigns `id` and `created_at`.
    fn insert(
        &self,
        owner: &OwnerId,
        task: NewTask,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>>;

    /// Applies a partial update to one of the owner's tasks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no task with this id belongs to
    /// the owner.
    fn update(
        &self,
        owner: &OwnerId,
        id: TaskId,
        patch: TaskPatch,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>>;

    /// Inverts the completed flag of one of the owner's tasks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` under the same rule as `update`.
    fn toggle(
        &self,
        owner: &OwnerId,
        id: TaskId,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>>;

    /// Physically deletes one of the owner's tasks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    fn delete(&self, owner: &OwnerId, id: TaskId)
    -> BoxFuture<'static, Result<(), RepositoryError>>;
}

// =============================================================================
// Tests
// =============================================================================
