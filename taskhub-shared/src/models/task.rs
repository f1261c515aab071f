/// Task model and database operations
///
/// Tasks belong to exactly one project and may be assigned to one user.
/// Every create and update is mirrored by an entry in the history ledger
/// (see `task_history`), written by the task service in the same transaction.
///
/// # Status
///
/// ```text
/// TO_DO → IN_PROGRESS → DONE
/// ```
///
/// Any status may be set by an update; no transition order is enforced.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('TO_DO', 'IN_PROGRESS', 'DONE');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL,
///     description TEXT NOT NULL,
///     project_id UUID NOT NULL REFERENCES projects(id),
///     assigned_user_id UUID REFERENCES users(id),
///     status task_status NOT NULL DEFAULT 'TO_DO',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::task::{Task, CreateTask, UpdateTask, TaskStatus};
/// use taskhub_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     project_id: Uuid::new_v4(),
///     name: "Write copy".to_string(),
///     description: "Landing page".to_string(),
/// }).await?;
///
/// Task::update(&pool, task.id, UpdateTask {
///     status: Some(TaskStatus::InProgress),
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use super::task_history::HistoryEntryWithActor;

/// Task progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    ToDo,
    InProgress,
    Done,
}

/// Error returned when parsing a status string outside the status set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown task status '{0}', expected one of TO_DO, IN_PROGRESS, DONE")]
pub struct UnknownStatus(pub String);

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "TO_DO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::ToDo
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TO_DO" => Ok(TaskStatus::ToDo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    pub name: String,

    pub description: String,

    /// Owning project
    pub project_id: Uuid,

    /// User the task is assigned to, if any
    pub assigned_user_id: Option<Uuid>,

    pub status: TaskStatus,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
}

/// Patch applied by `Task::update`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

/// A task with its history, as returned by project task listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskWithHistory {
    #[serde(flatten)]
    pub task: Task,

    pub history: Vec<HistoryEntryWithActor>,
}

impl Task {
    /// Creates a new task in `TO_DO` status
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, project_id, assigned_user_id, status,
                      created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.name)
        .bind(data.description)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, project_id, assigned_user_id, status,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Applies a patch, leaving `None` fields untouched
    ///
    /// # Returns
    ///
    /// The updated task if found, None if it doesn't exist
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, project_id, assigned_user_id, status,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.status)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Sets the assignee of a task
    pub async fn assign<'e, E>(
        executor: E,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET assigned_user_id = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, project_id, assigned_user_id, status,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Clears the assignee on every task assigned to `user_id`
    pub async fn unassign_user<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET assigned_user_id = NULL, updated_at = NOW()
            WHERE assigned_user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes a task row
    ///
    /// History entries must already be gone.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task of a project
    pub async fn delete_all_for_project<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Lists a project's tasks in creation order
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, project_id, assigned_user_id, status,
                   created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }
}
