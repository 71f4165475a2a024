//! Client-side task list state.
//!
//! [`TaskBoard`] keeps the list the user sees in step with the server. Toggle
//! and delete are applied locally before the request is sent; if the request
//! fails the board re-reads the authoritative list and returns a [`Notice`].
//! No failure is dropped without that re-read.

use crate::domain::{StatusFilter, TaskFilter, TaskId};

use super::task_client::{ClientError, TaskClient};
use crate::api::TaskResponse;

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Message text.
    pub message: String,
}

impl Notice {
    fn failed(action: &str, error: &ClientError) -> Self {
        tracing::warn!(%error, action, "Task request failed");
        Self {
            message: format!("Failed to {action} task"),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.message)
    }
}

/// Task list view with search and status filter.
#[derive(Debug, Clone)]
pub struct TaskBoard {
    client: TaskClient,
    tasks: Vec<TaskResponse>,
    search: String,
    status: StatusFilter,
}

impl TaskBoard {
    /// Creates an empty board. Call [`TaskBoard::refresh`] to load it.
    #[must_use]
    pub fn new(client: TaskClient) -> Self {
        Self {
            client,
            tasks: Vec::new(),
            search: String::new(),
            status: StatusFilter::All,
        }
    }

    /// Returns every loaded task, newest first.
    #[must_use]
    pub fn tasks(&self) -> &[TaskResponse] {
        &self.tasks
    }

    /// Sets the title search text.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    /// Sets the status filter.
    pub fn set_status(&mut self, status: StatusFilter) {
        self.status = status;
    }

    /// Returns the tasks passing the current search and status filter.
    #[must_use]
    pub fn visible(&self) -> Vec<&TaskResponse> {
        let filter = TaskFilter::new(self.status, &self.search);
        self.tasks
            .iter()
            .filter(|task| filter.accepts(&task.title, task.completed))
            .collect()
    }

    /// Replaces the local list with the server's.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the list cannot be fetched; the local list is
    /// left unchanged.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        self.tasks = self.client.list_tasks().await?;
        Ok(())
    }

    /// Re-reads the list after a failure. A failing re-read keeps the
    /// current list; the caller already has a notice to show.
    async fn resync(&mut self) {
        if let Err(error) = self.refresh().await {
            tracing::warn!(%error, "Failed to re-read tasks");
        }
    }

    /// Creates a task, then re-reads the list.
    pub async fn create(&mut self, title: &str) -> Option<Notice> {
        let notice = self
            .client
            .create_task(title)
            .await
            .err()
            .map(|error| Notice::failed("create", &error));
        self.resync().await;
        notice
    }

    /// Flips a task's completion flag, optimistically.
    pub async fn toggle(&mut self, id: TaskId) -> Option<Notice> {
        if let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) {
            task.completed = !task.completed;
        }

        match self.client.toggle_task(id).await {
            Ok(updated) => {
                if let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) {
                    *task = updated;
                }
                None
            }
            Err(error) => {
                let notice = Notice::failed("update", &error);
                self.resync().await;
                Some(notice)
            }
        }
    }

    /// Deletes a task, optimistically.
    pub async fn delete(&mut self, id: TaskId) -> Option<Notice> {
        self.tasks.retain(|task| task.id != id);

        match self.client.delete_task(id).await {
            Ok(_) => None,
            Err(error) => {
                let notice = Notice::failed("delete", &error);
                self.resync().await;
                Some(notice)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn task(id: i64, title: &str, completed: bool) -> TaskResponse {
        TaskResponse {
            id: TaskId::new(id),
            title: title.to_string(),
            description: None,
            completed,
            created_at: Utc::now(),
        }
    }

    fn board() -> TaskBoard {
        let mut board = TaskBoard::new(TaskClient::new("http://127.0.0.1:9", "token"));
        board.tasks = vec![
            task(3, "Buy milk", false),
            task(2, "Write report", true),
            task(1, "buy bread", true),
        ];
        board
    }

    #[rstest]
    #[case(StatusFilter::All, "", vec![3, 2, 1])]
    #[case(StatusFilter::Active, "", vec![3])]
    #[case(StatusFilter::Completed, "", vec![2, 1])]
    #[case(StatusFilter::All, "BUY", vec![3, 1])]
    #[case(StatusFilter::Completed, "buy", vec![1])]
    #[case(StatusFilter::Active, "report", vec![])]
    fn test_visible(
        #[case] status: StatusFilter,
        #[case] search: &str,
        #[case] expected: Vec<i64>,
    ) {
        let mut board = board();
        board.set_status(status);
        board.set_search(search);

        let ids: Vec<i64> = board.visible().iter().map(|task| task.id.value()).collect();

        assert_eq!(ids, expected);
    }
}
