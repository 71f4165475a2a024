//! `PostgreSQL` task repository.
//!
//! Uses `sqlx` with a shared `PgPool`. Each operation is a single statement
//! that carries `owner_id = $owner` in its `WHERE` clause, so ownership is
//! checked by the database in the same round trip that reads or writes.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE task (
//!     id BIGSERIAL PRIMARY KEY,
//!     title TEXT NOT NULL CHECK (length(btrim(title)) > 0),
//!     description TEXT,
//!     completed BOOLEAN NOT NULL DEFAULT FALSE,
//!     owner_id TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! CREATE INDEX idx_task_owner_created ON task (owner_id, created_at DESC, id DESC);
//! ```

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use sqlx::PgPool;

use crate::domain::{NewTask, OwnerId, Task, TaskId, TaskPatch, Timestamp};
use crate::infrastructure::{RepositoryError, TaskRepository};

const TASK_COLUMNS: &str = "id, title, description, completed, owner_id, created_at";

/// Row shape of the `task` table.
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    completed: bool,
    owner_id: String,
    created_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: TaskId::new(row.id),
            title: row.title,
            description: row.description,
            completed: row.completed,
            owner_id: OwnerId::new(row.owner_id),
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
fn database_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

/// `PostgreSQL` implementation of [`TaskRepository`].
///
/// # Example
///
/// ```ignore
/// let pool = PgPool::connect("postgres://localhost/tasks").await?;
/// let repository = PostgresTaskRepository::new(pool);
///
/// let task = repository.insert(&owner, NewTask::new("Buy milk", None)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TaskRepository for PostgresTaskRepository {
    fn list(&self, owner: &OwnerId) -> BoxFuture<'static, Result<Vec<Task>, RepositoryError>> {
        let pool = self.pool.clone();
        let owner = owner.clone();

        Box::pin(async move {
            let rows: Vec<TaskRow> = sqlx::query_as(&format!(
                "SELECT {TASK_COLUMNS} FROM task WHERE owner_id = $1 \
                 ORDER BY created_at DESC, id DESC"
            ))
            .bind(owner.as_str())
            .fetch_all(&pool)
            .await
            .map_err(database_error)?;

            Ok(rows.into_iter().map(Task::from).collect())
        })
    }

    fn insert(
        &self,
        owner: &OwnerId,
        task: NewTask,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>> {
        let pool = self.pool.clone();
        let owner = owner.clone();

        Box::pin(async move {
            let row: TaskRow = sqlx::query_as(&format!(
                "INSERT INTO task (title, description, completed, owner_id) \
                 VALUES ($1, $2, FALSE, $3) RETURNING {TASK_COLUMNS}"
            ))
            .bind(&task.title)
            .bind(task.description.as_deref())
            .bind(owner.as_str())
            .fetch_one(&pool)
            .await
            .map_err(database_error)?;

            Ok(Task::from(row))
        })
    }

    fn update(
        &self,
        owner: &OwnerId,
        id: TaskId,
        patch: TaskPatch,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>> {
        let pool = self.pool.clone();
        let owner = owner.clone();

        Box::pin(async move {
            let row: Option<TaskRow> = sqlx::query_as(&format!(
                "UPDATE task SET \
                     title = COALESCE($3, title), \
                     description = CASE WHEN $4 THEN $5 ELSE description END, \
                     completed = COALESCE($6, completed) \
                 WHERE id = $1 AND owner_id = $2 RETURNING {TASK_COLUMNS}"
            ))
            .bind(id.value())
            .bind(owner.as_str())
            .bind(patch.title.as_deref())
            .bind(patch.description.is_some())
            .bind(patch.description.flatten())
            .bind(patch.completed)
            .fetch_optional(&pool)
            .await
            .map_err(database_error)?;

            row.map(Task::from).ok_or(RepositoryError::NotFound(id))
        })
    }

    fn toggle(
        &self,
        owner: &OwnerId,
        id: TaskId,
    ) -> BoxFuture<'static, Result<Task, RepositoryError>> {
        let pool = self.pool.clone();
        let owner = owner.clone();

        Box::pin(async move {
            let row: Option<TaskRow> = sqlx::query_as(&format!(
                "UPDATE task SET completed = NOT completed \
                 WHERE id = $1 AND owner_id = $2 RETURNING {TASK_COLUMNS}"
            ))
            .bind(id.value())
            .bind(owner.as_str())
            .fetch_optional(&pool)
            .await
            .map_err(database_error)?;

            row.map(Task::from).ok_or(RepositoryError::NotFound(id))
        })
    }

    fn delete(
        &self,
        owner: &OwnerId,
        id: TaskId,
    ) -> BoxFuture<'static, Result<(), RepositoryError>> {
        let pool = self.pool.clone();
        let owner = owner.clone();

        Box::pin(async move {
            let result = sqlx::query("DELETE FROM task WHERE id = $1 AND owner_id = $2")
                .bind(id.value())
                .bind(owner.as_str())
                .execute(&pool)
                .await
                .map_err(database_error)?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound(id));
            }
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

    #[rstest]
    fn test_task_row_conversion() {
        let created_at = Utc::now();
        let task = Task::from(TaskRow {
            id: 9,
            title: "Ship release".to_string(),
            description: None,
            completed: true,
            owner_id: "alice".to_string(),
            created_at,
        });

        assert_eq!(task.id, TaskId::new(9));
        assert!(task.completed);
        assert_eq!(task.owner_id, OwnerId::new("alice"));
        assert_eq!(task.created_at.as_datetime(), &created_at);
    }

    // -------------------------------------------------------------------------
    // Integration Tests (require PostgreSQL)
    // -------------------------------------------------------------------------

    async fn connect() -> PostgresTaskRepository {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/test".into());
        let pool = PgPool::connect(&database_url).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        PostgresTaskRepository::new(pool)
    }

    #[rstest]
    #[tokio::test]
    #[ignore = "Requires PostgreSQL instance"]
    async fn test_postgres_owner_scoping() {
        let repository = connect().await;
        let alice = OwnerId::new("pg-test-alice");
        let bob = OwnerId::new("pg-test-bob");

        let task = repository
            .insert(&alice, NewTask::new("Private", None))
            .await
            .unwrap();

        assert_eq!(
            repository.toggle(&bob, task.id).await,
            Err(RepositoryError::NotFound(task.id))
        );
        assert_eq!(
            repository.delete(&bob, task.id).await,
            Err(RepositoryError::NotFound(task.id))
        );
        assert!(
            repository
                .list(&bob)
                .await
                .unwrap()
                .iter()
                .all(|listed| listed.id != task.id)
        );

        let toggled = repository.toggle(&alice, task.id).await.unwrap();
        assert!(toggled.completed);

        repository.delete(&alice, task.id).await.unwrap();
        assert_eq!(
            repository.delete(&alice, task.id).await,
            Err(RepositoryError::NotFound(task.id))
        );
    }

    #[rstest]
    #[tokio::test]
    #[ignore = "Requires PostgreSQL instance"]
    async fn test_postgres_partial_update() {
        let repository = connect().await;
        let owner = OwnerId::new("pg-test-update");

        let task = repository
            .insert(&owner, NewTask::new("Draft", Some("notes".to_string())))
            .await
            .unwrap();

        let updated = repository
            .update(
                &owner,
                task.id,
                TaskPatch {
                    title: Some("Final".to_string()),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.description.as_deref(), Some("notes"));
        assert!(!updated.completed);

        let cleared = repository
            .update(
                &owner,
                task.id,
                TaskPatch {
                    description: Some(None),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(cleared.title, "Final");
        assert!(cleared.description.is_none());

        repository.delete(&owner, task.id).await.unwrap();
    }
}
