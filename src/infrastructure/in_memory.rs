//! In-memory task repository.
//!
//! Suitable for tests and local development. Rows live in a map behind a
//! `tokio::sync::RwLock`; ids come from a counter guarded by the same lock so
//! they are unique and increasing.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::domain::{NewTask, OwnerId, Task, TaskId, TaskPatch, Timestamp, newest_first};
use crate::infrastructure::{RepositoryError, TaskRepository};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<TaskId, Task>,
    last_id: i64,
}

impl Table {
    /// Returns the row only if it belongs to `owner`.
    fn owned_mut(&mut self, owner: &OwnerId, id: TaskId) -> Result<&mut Task, RepositoryError> {
        self.rows
            .get_mut(&id)
            .filter(|task| task.is_owned_by(owner))
            .ok_or(RepositoryError::NotFound(id))
    }
}

/// In-memory implementation of [`TaskRepository`].
///
/// # Example
///
/// ```ignore
/// let repository = InMemoryTaskRepository::new();
/// let owner = OwnerId::new("alice");
///
/// let task = repository.insert(&owner, NewTask::new("Buy milk", None)).await?;
/// let tasks = repository.list(&owner).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    table: Arc<RwLock<Table>>,
}

impl InMemoryTaskRepository {
    /// Creates a new empty in-memory task repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored rows across all owners.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// Returns `true` if no rows are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[allow(clippy::significant_drop_tightening)]
impl TaskRepository for InMemoryTaskRepository {
    fn list(&self, owner: &OwnerId) -> BoxFuture<'static, Result<Vec<Task>, RepositoryError>> {
        let table = Arc::clone(&self.table);
        let owner = owner.clone();
        Box::pin(async move {
            let guard = table.read().await;
            let mut tasks: Vec<Task> = guard
                .rows
                .values()
                .filter(|task| task.is_owned_by(&owner))
                .cloned()
                .collect();
            drop(guard);

            tasks.sort_by(newest_first);
            Ok(tasks)
        })
    }

    fn insert(
        &self,
        owner: &OwnerId,
        task: NewTask,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>> {
        let table = Arc::clone(&self.table);
        let owner = owner.clone();
        Box::pin(async move {
            let mut guard = table.write().await;
            guard.last_id += 1;
            let id = TaskId::new(guard.last_id);

            let mut created = Task::new(id, owner, task.title, Timestamp::now());
            created.description = task.description;

            guard.rows.insert(id, created.clone());
            Ok(created)
        })
    }

    fn update(
        &self,
        owner: &OwnerId,
        id: TaskId,
        patch: TaskPatch,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>> {
        let table = Arc::clone(&self.table);
        let owner = owner.clone();
        Box::pin(async move {
            let mut guard = table.write().await;
            let row = guard.owned_mut(&owner, id)?;
            *row = row.clone().apply(&patch);
            Ok(row.clone())
        })
    }

    fn toggle(
        &self,
        owner: &OwnerId,
        id: TaskId,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>> {
        let table = Arc::clone(&self.table);
        let owner = owner.clone();
        Box::pin(async move {
            let mut guard = table.write().await;
            let row = guard.owned_mut(&owner, id)?;
            row.completed = !row.completed;
            Ok(row.clone())
        })
    }

    fn delete(
        &self,
        owner: &OwnerId,
        id: TaskId,
    ) -> BoxFuture<'static, Result<(), RepositoryError>> {
        let table = Arc::clone(&self.table);
        let owner = owner.clone();
        Box::pin(async move {
            let mut guard = table.write().await;
            guard.owned_mut(&owner, id)?;
            guard.rows.remove(&id);
            Ok(())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn alice() -> OwnerId {
        OwnerId::new("alice")
    }

    fn bob() -> OwnerId {
        OwnerId::new("bob")
    }

    async fn insert(repository: &InMemoryTaskRepository, owner: &OwnerId, title: &str) -> Task {
        repository
            .insert(owner, NewTask::new(title, None))
            .await
            .expect("insert failed")
    }

    #[rstest]
    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let repository = InMemoryTaskRepository::new();

        let first = insert(&repository, &alice(), "first").await;
        let second = insert(&repository, &bob(), "second").await;

        assert_eq!(first.id, TaskId::new(1));
        assert_eq!(second.id, TaskId::new(2));
        assert!(!first.completed);
        assert_eq!(first.owner_id, alice());
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_is_scoped_and_newest_first() {
        let repository = InMemoryTaskRepository::new();
        insert(&repository, &alice(), "older").await;
        insert(&repository, &bob(), "not mine").await;
        insert(&repository, &alice(), "Buy milk").await;

        let tasks = repository.list(&alice()).await.unwrap();

        let titles: Vec<&str> = tasks.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, vec!["Buy milk", "older"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_empty() {
        let repository = InMemoryTaskRepository::new();
        assert!(repository.list(&alice()).await.unwrap().is_empty());
        assert!(repository.is_empty().await);
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_partial_fields() {
        let repository = InMemoryTaskRepository::new();
        let task = insert(&repository, &alice(), "draft").await;

        let updated = repository
            .update(
                &alice(),
                task.id,
                TaskPatch {
                    title: Some("final".to_string()),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "final");
        assert!(!updated.completed);
        assert_eq!(updated.created_at, task.created_at);
    }

    #[rstest]
    #[tokio::test]
    async fn test_toggle_twice_restores_flag() {
        let repository = InMemoryTaskRepository::new();
        let task = insert(&repository, &alice(), "flip").await;

        let once = repository.toggle(&alice(), task.id).await.unwrap();
        let twice = repository.toggle(&alice(), task.id).await.unwrap();

        assert!(once.completed);
        assert!(!twice.completed);
    }

    #[rstest]
    #[tokio::test]
    async fn test_foreign_task_is_not_found_and_untouched() {
        let repository = InMemoryTaskRepository::new();
        let task = insert(&repository, &alice(), "private").await;

        assert_eq!(
            repository.toggle(&bob(), task.id).await,
            Err(RepositoryError::NotFound(task.id))
        );
        assert_eq!(
            repository
                .update(&bob(), task.id, TaskPatch::default())
                .await,
            Err(RepositoryError::NotFound(task.id))
        );
        assert_eq!(
            repository.delete(&bob(), task.id).await,
            Err(RepositoryError::NotFound(task.id))
        );

        let tasks = repository.list(&alice()).await.unwrap();
        assert_eq!(tasks, vec![task]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let repository = InMemoryTaskRepository::new();
        let task = insert(&repository, &alice(), "gone").await;

        assert_eq!(repository.delete(&alice(), task.id).await, Ok(()));
        assert_eq!(
            repository.delete(&alice(), task.id).await,
            Err(RepositoryError::NotFound(task.id))
        );
        assert_eq!(
            repository.toggle(&alice(), task.id).await,
            Err(RepositoryError::NotFound(task.id))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let repository = InMemoryTaskRepository::new();
        let first = insert(&repository, &alice(), "one").await;
        repository.delete(&alice(), first.id).await.unwrap();

        let second = insert(&repository, &alice(), "two").await;
        assert_ne!(first.id, second.id);
    }
}
