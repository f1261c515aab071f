/// Task endpoints
///
/// `GET` and `POST /tasks/:id` take a project id; `PUT`, `DELETE` and the
/// assignment route take a task id. Reading needs any membership in the
/// project, every write needs OWNER or WORKER.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiPath, ValidatedJson},
};
use axum::{
    extract::State,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::middleware::AuthContext,
    models::task::{Task, TaskWithHistory},
    services::tasks::{self, TaskChanges},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,

    /// TO_DO, IN_PROGRESS or DONE
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignTaskRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskWithHistory>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Lists the project's tasks, each with its history
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a member
/// - `404 Not Found`: Project doesn't exist
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<Uuid>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = tasks::list_tasks(&state.db, auth.user_id, project_id).await?;

    Ok(Json(TaskListResponse { tasks }))
}

/// Creates a task in the project
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task =
        tasks::create_task(&state.db, auth.user_id, project_id, &req.name, &req.description)
            .await?;

    Ok(Json(TaskResponse { task }))
}

/// Patches name, description and/or status
///
/// # Errors
///
/// - `400 Bad Request`: Unknown status
/// - `403 Forbidden`: Caller is a READER or not a member
/// - `404 Not Found`: Task doesn't exist
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let changes = TaskChanges {
        name: req.name,
        description: req.description,
        status: req.status,
    };
    let task = tasks::update_task(&state.db, auth.user_id, task_id, changes).await?;

    Ok(Json(TaskResponse { task }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    tasks::delete_task(&state.db, auth.user_id, task_id).await?;

    Ok(Json(MessageResponse {
        message: "Task deleted".to_string(),
    }))
}

/// Assigns the task to an OWNER or WORKER of its project
///
/// ```text
/// POST /tasks/asign-user-to/:task_id
///
/// { "user_id": "3f0c..." }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller or assignee lacks the OWNER/WORKER role
/// - `404 Not Found`: Task doesn't exist
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<AssignTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = tasks::assign_task(&state.db, auth.user_id, task_id, req.user_id).await?;

    Ok(Json(TaskResponse { task }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_status_only() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"status": "DONE"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.status.as_deref(), Some("DONE"));
        assert!(req.name.is_none());
    }

    #[test]
    fn test_assign_request_requires_uuid() {
        assert!(serde_json::from_str::<AssignTaskRequest>(r#"{"user_id": "nope"}"#).is_err());
    }
}
