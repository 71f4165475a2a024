//! Bounded backend calls.
//!
//! Wraps any [`TaskRepository`] or [`SessionVerifier`] so that every call
//! fails instead of hanging when the backend stalls. A stalled task store
//! yields `RepositoryError::Timeout`, a stalled session store
//! `SessionError::Unavailable`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::domain::{NewTask, OwnerId, Task, TaskId, TaskPatch};
use crate::infrastructure::{
    Credentials, RepositoryError, Session, SessionError, SessionVerifier, TaskRepository,
};

/// Repository decorator that applies a deadline to each operation.
#[derive(Clone)]
pub struct TimeoutTaskRepository {
    inner: Arc<dyn TaskRepository + Send + Sync>,
    limit: Duration,
}

impl TimeoutTaskRepository {
    /// Wraps `inner`, failing any call that takes longer than `limit`.
    #[must_use]
    pub fn new(inner: Arc<dyn TaskRepository + Send + Sync>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    fn bounded<T: Send + 'static>(
        &self,
        operation: BoxFuture<'static, Result<T, RepositoryError>>,
    ) -> BoxFuture<'static, Result<T, RepositoryError>> {
        bounded(self.limit, operation, RepositoryError::Timeout)
    }
}

impl std::fmt::Debug for TimeoutTaskRepository {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TimeoutTaskRepository")
            .field("inner", &"Arc<dyn TaskRepository>")
            .field("limit", &self.limit)
            .finish()
    }
}

/// Runs `operation` under `limit`, turning expiry into `expired(millis)`.
fn bounded<T, E, F>(
    limit: Duration,
    operation: F,
    expired: fn(u64) -> E,
) -> BoxFuture<'static, Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
{
    Box::pin(async move {
        tokio::time::timeout(limit, operation).await.unwrap_or_else(|_| {
            #[allow(clippy::cast_possible_truncation)]
            let millis = limit.as_millis() as u64;
            Err(expired(millis))
        })
    })
}

impl TaskRepository for TimeoutTaskRepository {
    fn list(&self, owner: &OwnerId) -> BoxFuture<'static, Result<Vec<Task>, RepositoryError>> {
        self.bounded(self.inner.list(owner))
    }

    fn insert(
        &self,
        owner: &OwnerId,
        task: NewTask,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>> {
        self.bounded(self.inner.insert(owner, task))
    }

    fn update(
        &self,
        owner: &OwnerId,
        id: TaskId,
        patch: TaskPatch,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>> {
        self.bounded(self.inner.update(owner, id, patch))
    }

    fn toggle(
        &self,
        owner: &OwnerId,
        id: TaskId,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>> {
        self.bounded(self.inner.toggle(owner, id))
    }

    fn delete(
        &self,
        owner: &OwnerId,
        id: TaskId,
    ) -> BoxFuture<'static, Result<(), RepositoryError>> {
        self.bounded(self.inner.delete(owner, id))
    }
}

/// Session verifier decorator that applies a deadline to each lookup.
#[derive(Clone)]
pub struct TimeoutSessionVerifier {
    inner: Arc<dyn SessionVerifier + Send + Sync>,
    limit: Duration,
}

impl TimeoutSessionVerifier {
    /// Wraps `inner`, failing any lookup that takes longer than `limit`.
    #[must_use]
    pub fn new(inner: Arc<dyn SessionVerifier + Send + Sync>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

impl std::fmt::Debug for TimeoutSessionVerifier {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TimeoutSessionVerifier")
            .field("inner", &"Arc<dyn SessionVerifier>")
            .field("limit", &self.limit)
            .finish()
    }
}

impl SessionVerifier for TimeoutSessionVerifier {
    fn verify(
        &self,
        credentials: Option<Credentials>,
    ) -> BoxFuture<'static, Result<Session, SessionError>> {
        bounded(self.limit, self.inner.verify(credentials), |millis| {
            SessionError::Unavailable(format!("session lookup timed out after {millis} ms"))
        })
    }
}
