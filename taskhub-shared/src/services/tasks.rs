/// Task lifecycle
///
/// Creation, update and assignment append a history entry in the same
/// transaction as the task write. Deletion removes the task's history first.
/// Assignment requires both the actor and the assignee to be OWNER or WORKER of
/// the task's project.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::authorization::{
    authorize_project, authorize_task, require_assignable, ProjectAction,
};
use crate::error::{CoreError, CoreResult};
use crate::models::task::{CreateTask, Task, TaskStatus, TaskWithHistory, UpdateTask};
use crate::models::task_history::{HistoryAction, HistoryEntryWithActor, TaskHistoryEntry};
use crate::services::{optional_text, required_text};

/// Patch requested for a task
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub name: Option<String>,
    pub description: Option<String>,

    /// One of TO_DO, IN_PROGRESS, DONE
    pub status: Option<String>,
}

/// Lists a project's tasks with their history (any member)
pub async fn list_tasks(
    pool: &PgPool,
    actor_id: Uuid,
    project_id: Uuid,
) -> CoreResult<Vec<TaskWithHistory>> {
    authorize_project(pool, actor_id, project_id, ProjectAction::ViewTasks).await?;

    let tasks = Task::list_by_project(pool, project_id).await?;
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();

    let mut history: HashMap<Uuid, Vec<HistoryEntryWithActor>> = HashMap::new();
    for entry in TaskHistoryEntry::list_for_tasks(pool, &ids).await? {
        history.entry(entry.task_id).or_default().push(entry);
    }

    Ok(tasks
        .into_iter()
        .map(|task| TaskWithHistory {
            history: history.remove(&task.id).unwrap_or_default(),
            task,
        })
        .collect())
}

/// Creates a task in a project (OWNER or WORKER)
pub async fn create_task(
    pool: &PgPool,
    actor_id: Uuid,
    project_id: Uuid,
    name: &str,
    description: &str,
) -> CoreResult<Task> {
    authorize_project(pool, actor_id, project_id, ProjectAction::CreateTask).await?;

    let name = required_text("name", name)?;
    let description = required_text("description", description)?;

    let mut tx = pool.begin().await?;

    let task = Task::create(
        &mut *tx,
        CreateTask {
            project_id,
            name,
            description,
        },
    )
    .await?;
    TaskHistoryEntry::append(&mut *tx, actor_id, task.id, HistoryAction::Created, Utc::now())
        .await?;

    tx.commit().await?;

    info!(task_id = %task.id, project_id = %project_id, "Task created");
    Ok(task)
}

/// Applies a patch to a task (OWNER or WORKER of its project)
///
/// # Errors
///
/// - `NotFound` if the task doesn't exist
/// - `Forbidden` for READERs and non-members
/// - `Validation` for a blank field or an unknown status
pub async fn update_task(
    pool: &PgPool,
    actor_id: Uuid,
    task_id: Uuid,
    changes: TaskChanges,
) -> CoreResult<Task> {
    authorize_task(pool, actor_id, task_id, ProjectAction::UpdateTask).await?;

    let status = changes
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let patch = UpdateTask {
        name: optional_text("name", changes.name)?,
        description: optional_text("description", changes.description)?,
        status,
    };

    let mut tx = pool.begin().await?;

    let task = Task::update(&mut *tx, task_id, patch)
        .await?
        .ok_or_else(|| CoreError::NotFound("Task not found".to_string()))?;
    TaskHistoryEntry::append(&mut *tx, actor_id, task.id, HistoryAction::Updated, Utc::now())
        .await?;

    tx.commit().await?;

    info!(task_id = %task.id, status = task.status.as_str(), "Task updated");
    Ok(task)
}

/// Deletes a task and its history (OWNER or WORKER of its project)
pub async fn delete_task(pool: &PgPool, actor_id: Uuid, task_id: Uuid) -> CoreResult<()> {
    authorize_task(pool, actor_id, task_id, ProjectAction::DeleteTask).await?;

    let mut tx = pool.begin().await?;

    let history = TaskHistoryEntry::delete_for_task(&mut *tx, task_id).await?;
    if !Task::delete(&mut *tx, task_id).await? {
        return Err(CoreError::NotFound("Task not found".to_string()));
    }

    tx.commit().await?;

    info!(task_id = %task_id, history_entries = history, "Task deleted");
    Ok(())
}

/// Assigns a task to a member of its project
///
/// # Errors
///
/// - `NotFound` if the task doesn't exist
/// - `Forbidden` if the actor is not OWNER/WORKER, or the assignee is a READER
///   or not a member
pub async fn assign_task(
    pool: &PgPool,
    actor_id: Uuid,
    task_id: Uuid,
    assignee_id: Uuid,
) -> CoreResult<Task> {
    let (task, _) = authorize_task(pool, actor_id, task_id, ProjectAction::AssignTask).await?;
    require_assignable(pool, task.project_id, assignee_id).await?;

    let mut tx = pool.begin().await?;

    let task = Task::assign(&mut *tx, task_id, assignee_id)
        .await?
        .ok_or_else(|| CoreError::NotFound("Task not found".to_string()))?;
    TaskHistoryEntry::append(&mut *tx, actor_id, task.id, HistoryAction::Assigned, Utc::now())
        .await?;

    tx.commit().await?;

    info!(task_id = %task.id, assignee_id = %assignee_id, "Task assigned");
    Ok(task)
}
