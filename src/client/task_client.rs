//! HTTP client for the task API.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::{ApiError, CreateTaskRequest, DeleteResponse, TaskResponse, UpdateTaskRequest};
use crate::domain::TaskId;

/// Errors returned by [`TaskClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{status}: {message}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Message from the server's error body, or the status reason.
        message: String,
    },
}

impl ClientError {
    /// Returns the response status, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http(_) => None,
            Self::Status { status, .. } => Some(*status),
        }
    }
}

/// Client bound to one API base URL and one session token.
#[derive(Debug, Clone)]
pub struct TaskClient {
    http: Client,
    base_url: String,
    token: String,
}

impl TaskClient {
    /// Creates a client. A trailing `/` on `base_url` is ignored.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_http_client(Client::new(), base_url, token)
    }

    /// Creates a client over an existing `reqwest` client.
    #[must_use]
    pub fn with_http_client(
        http: Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    /// Fetches the caller's tasks, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the server rejects it.
    pub async fn list_tasks(&self) -> Result<Vec<TaskResponse>, ClientError> {
        let response = self
            .authorized(self.http.get(self.url("/tasks")))
            .send()
            .await?;
        decode(response).await
    }

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the server rejects it.
    pub async fn create_task(&self, title: &str) -> Result<TaskResponse, ClientError> {
        let body = CreateTaskRequest {
            title: Some(title.to_string()),
            description: None,
        };
        let response = self
            .authorized(self.http.post(self.url("/tasks")))
            .json(&body)
            .send()
            .await?;
        decode(response).await
    }

    /// Flips a task's completion flag.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the server rejects it.
    pub async fn toggle_task(&self, id: TaskId) -> Result<TaskResponse, ClientError> {
        let response = self
            .authorized(self.http.patch(self.url(&format!("/tasks/{id}/complete"))))
            .send()
            .await?;
        decode(response).await
    }

    /// Partially updates a task.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the server rejects it.
    pub async fn update_task(
        &self,
        id: TaskId,
        patch: &UpdateTaskRequest,
    ) -> Result<TaskResponse, ClientError> {
        let response = self
            .authorized(self.http.patch(self.url(&format!("/tasks/{id}"))))
            .json(patch)
            .send()
            .await?;
        decode(response).await
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the server rejects it.
    pub async fn delete_task(&self, id: TaskId) -> Result<DeleteResponse, ClientError> {
        let response = self
            .authorized(self.http.delete(self.url(&format!("/tasks/{id}"))))
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = match response.json::<ApiError>().await {
        Ok(error) => error.message,
        Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
    };
    Err(ClientError::Status { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:8000", "http://localhost:8000/tasks")]
    #[case("http://localhost:8000/", "http://localhost:8000/tasks")]
    fn test_url_joins_base(#[case] base_url: &str, #[case] expected: &str) {
        let client = TaskClient::new(base_url, "token");
        assert_eq!(client.url("/tasks"), expected);
    }

    #[rstest]
    fn test_status_error_display() {
        let error = ClientError::Status {
            status: StatusCode::NOT_FOUND,
            message: "Task not found".to_string(),
        };
        assert_eq!(error.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(error.to_string(), "404 Not Found: Task not found");
    }
}
