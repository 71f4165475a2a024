//! Data Transfer Objects for API requests and responses.
//!
//! The DTOs are shared by the server handlers and by the client in
//! [`crate::client`], so both sides agree on one wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{FieldError, ValidationError};
use crate::domain::{NewTask, StatusFilter, Task, TaskId, TaskPatch};

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

// =============================================================================
// Task DTOs
// =============================================================================

/// Request DTO for creating a new task.
///
/// The title may also be sent as `task`, the field name used by the web
/// front end's own route handlers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Title of the task.
    #[serde(default, alias = "task")]
    pub title: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request DTO for a partial update.
///
/// `description` has three states: absent keeps the stored text, `null` or
/// `""` clears it, and any other text replaces it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description, `Some(None)` for an explicit `null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    /// New completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Wraps a present field in `Some`, so `null` is kept apart from absent.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of `PATCH /tasks`: a partial update of the task named in the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTaskByIdRequest {
    /// Task to update.
    pub id: TaskId,
    /// Fields to change.
    #[serde(flatten)]
    pub changes: UpdateTaskRequest,
}

/// Body of `DELETE /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTaskRequest {
    /// Task to delete.
    pub id: TaskId,
}

/// Query parameters for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Completion-state filter (default: all).
    #[serde(default)]
    pub status: Option<StatusFilter>,
    /// Case-insensitive title search.
    #[serde(default)]
    pub q: Option<String>,
}

/// Response DTO for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Task ID.
    pub id: TaskId,
    /// Title of the task.
    pub title: String,
    /// Description of the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the task is completed.
    pub completed: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            completed: task.completed,
            created_at: *task.created_at.as_datetime(),
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            completed: task.completed,
            created_at: *task.created_at.as_datetime(),
        }
    }
}

/// Confirmation body for a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Confirmation message.
    pub message: String,
}

impl DeleteResponse {
    /// The confirmation returned after a successful delete.
    #[must_use]
    pub fn deleted() -> Self {
        Self {
            message: "Deleted successfully".to_string(),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a task title.
///
/// # Validation Rules
///
/// - Title is trimmed
/// - Title must not be empty
/// - Title must not exceed 200 characters
///
/// # Errors
///
/// Returns `ValidationError` on the `title` field.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::single("title", "Title is required"));
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::single(
            "title",
            "Title must not exceed 200 characters",
        ));
    }

    Ok(title.to_string())
}

/// Validates a task description. Empty descriptions become `None`.
///
/// # Errors
///
/// Returns `ValidationError` if the description exceeds 5000 characters.
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, ValidationError> {
    description.map_or(Ok(None), |description| {
        let description = description.trim();
        if description.is_empty() {
            Ok(None)
        } else if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            Err(ValidationError::single(
                "description",
                "Description must not exceed 5000 characters",
            ))
        } else {
            Ok(Some(description.to_string()))
        }
    })
}

/// Merges the field errors of independent validations.
fn merge_errors(errors: [Option<ValidationError>; 2]) -> ValidationError {
    ValidationError::new(
        errors
            .into_iter()
            .flatten()
            .flat_map(|error| error.errors)
            .collect::<Vec<FieldError>>(),
    )
}

/// Validates a create request.
///
/// # Errors
///
/// Returns every field error found in the request.
pub fn validate_create_request(request: &CreateTaskRequest) -> Result<NewTask, ValidationError> {
    let title = validate_title(request.title.as_deref().unwrap_or_default());
    let description = validate_description(request.description.as_deref());

    match (title, description) {
        (Ok(title), Ok(description)) => Ok(NewTask::new(title, description)),
        (title, description) => Err(merge_errors([title.err(), description.err()])),
    }
}

/// Validates an update request. An empty or `null` description clears it.
///
/// # Errors
///
/// Returns every field error found, or an error on `body` when the request
/// does not change anything.
pub fn validate_update_request(request: &UpdateTaskRequest) -> Result<TaskPatch, ValidationError> {
    let title = request.title.as_deref().map(validate_title).transpose();
    let description = request
        .description
        .as_ref()
        .map(|description| validate_description(description.as_deref()))
        .transpose();

    let patch = match (title, description) {
        (Ok(title), Ok(description)) => TaskPatch {
            title,
            description,
            completed: request.completed,
        },
        (title, description) => return Err(merge_errors([title.err(), description.err()])),
    };

    if patch.is_empty() {
        return Err(ValidationError::single(
            "body",
            "At least one of title, description or completed is required",
        ));
    }

    Ok(patch)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OwnerId, Timestamp};
    use rstest::rstest;

    #[rstest]
    fn test_task_response_from_task() {
        let task = Task::new(
            TaskId::new(1),
            OwnerId::new("alice"),
            "Ship release",
            Timestamp::now(),
        );

        let response = TaskResponse::from(&task);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "Ship release");
        assert_eq!(json["completed"], false);
        assert!(json.get("description").is_none());
        assert!(json.get("owner_id").is_none());
        assert!(json["created_at"].is_string());
    }

    #[rstest]
    fn test_create_request_accepts_task_alias() {
        let request: CreateTaskRequest = serde_json::from_str(r#"{"task":"Buy milk"}"#).unwrap();
        assert_eq!(request.title.as_deref(), Some("Buy milk"));
    }

    #[rstest]
    fn test_delete_response_message() {
        let json = serde_json::to_value(DeleteResponse::deleted()).unwrap();
        assert_eq!(json, serde_json::json!({"message": "Deleted successfully"}));
    }

    #[rstest]
    #[case("Valid Title", "Valid Title")]
    #[case("  Trimmed Title  ", "Trimmed Title")]
    fn test_validate_title_valid(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate_title(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_validate_title_empty(#[case] input: &str) {
        assert!(validate_title(input).is_err());
    }

    #[rstest]
    fn test_validate_title_length_counts_characters() {
        assert!(validate_title(&"é".repeat(200)).is_ok());
        assert!(validate_title(&"a".repeat(201)).is_err());
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some(" note "), Some("note"))]
    fn test_validate_description(#[case] input: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(
            validate_description(input).unwrap(),
            expected.map(str::to_string)
        );
    }

    #[rstest]
    fn test_validate_description_too_long() {
        assert!(validate_description(Some(&"a".repeat(5001))).is_err());
    }

    #[rstest]
    fn test_validate_create_request_missing_title() {
        let error = validate_create_request(&CreateTaskRequest::default()).unwrap_err();
        assert_eq!(error.errors[0].field, "title");
    }

    #[rstest]
    fn test_validate_create_request_collects_all_errors() {
        let request = CreateTaskRequest {
            title: Some(" ".to_string()),
            description: Some("a".repeat(5001)),
        };

        let error = validate_create_request(&request).unwrap_err();

        let fields: Vec<&str> = error.errors.iter().map(|error| error.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "description"]);
    }

    #[rstest]
    fn test_validate_update_request_partial() {
        let request = UpdateTaskRequest {
            completed: Some(true),
            ..UpdateTaskRequest::default()
        };

        let patch = validate_update_request(&request).unwrap();

        assert_eq!(patch.completed, Some(true));
        assert!(patch.title.is_none());
    }

    #[rstest]
    fn test_update_by_id_request_flattens_changes() {
        let request: UpdateTaskByIdRequest =
            serde_json::from_str(r#"{"id":7,"title":"Renamed"}"#).unwrap();
        assert_eq!(request.id, TaskId::new(7));
        assert_eq!(request.changes.title.as_deref(), Some("Renamed"));
        assert!(request.changes.completed.is_none());
    }

    #[rstest]
    #[case(r#"{"title":"Renamed"}"#, None)]
    #[case(r#"{"description":null}"#, Some(None))]
    #[case(r#"{"description":""}"#, Some(None))]
    #[case(r#"{"description":"  "}"#, Some(None))]
    #[case(r#"{"description":" note "}"#, Some(Some("note")))]
    fn test_validate_update_request_description(
        #[case] body: &str,
        #[case] expected: Option<Option<&str>>,
    ) {
        let request: UpdateTaskRequest = serde_json::from_str(body).unwrap();

        let patch = validate_update_request(&request).unwrap();

        assert_eq!(
            patch.description,
            expected.map(|description| description.map(str::to_string))
        );
    }

    #[rstest]
    fn test_update_request_serializes_cleared_description_as_null() {
        let request = UpdateTaskRequest {
            description: Some(None),
            ..UpdateTaskRequest::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"description": null}));
        assert_eq!(
            serde_json::to_value(UpdateTaskRequest::default()).unwrap(),
            serde_json::json!({})
        );
    }

    #[rstest]
    fn test_validate_update_request_empty() {
        let error = validate_update_request(&UpdateTaskRequest::default()).unwrap_err();
        assert_eq!(error.errors[0].field, "body");
    }

    #[rstest]
    fn test_validate_update_request_blank_title() {
        let request = UpdateTaskRequest {
            title: Some("  ".to_string()),
            ..UpdateTaskRequest::default()
        };
        assert!(validate_update_request(&request).is_err());
    }
}
