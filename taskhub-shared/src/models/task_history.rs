/// Task history ledger
///
/// Append-only audit trail of task actions. Entries are never updated; they are
/// removed only together with their task. The actor reference is nulled when the
/// acting account is deleted so the trail survives account removal.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_history (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID REFERENCES users(id),
///     task_id UUID NOT NULL REFERENCES tasks(id),
///     action TEXT NOT NULL,
///     action_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Action tags written by the task service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HistoryAction {
    Created,
    Updated,
    Assigned,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "CREATED",
            HistoryAction::Updated => "UPDATED",
            HistoryAction::Assigned => "ASSIGNED",
        }
    }
}

/// A raw ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskHistoryEntry {
    pub id: Uuid,

    /// Acting user, None once that account is deleted
    pub user_id: Option<Uuid>,

    pub task_id: Uuid,

    pub action: String,

    pub action_date: DateTime<Utc>,
}

/// Name and email of the user behind a history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryActor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A ledger entry joined with its actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntryWithActor {
    pub id: Uuid,

    #[serde(skip_serializing)]
    pub task_id: Uuid,

    pub action: String,

    pub action_date: DateTime<Utc>,

    pub user: Option<HistoryActor>,
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    task_id: Uuid,
    action: String,
    action_date: DateTime<Utc>,
    user_id: Option<Uuid>,
    user_name: Option<String>,
    user_email: Option<String>,
}

impl From<HistoryRow> for HistoryEntryWithActor {
    fn from(row: HistoryRow) -> Self {
        let user = match (row.user_id, row.user_name, row.user_email) {
            (Some(id), Some(name), Some(email)) => Some(HistoryActor { id, name, email }),
            _ => None,
        };

        HistoryEntryWithActor {
            id: row.id,
            task_id: row.task_id,
            action: row.action,
            action_date: row.action_date,
            user,
        }
    }
}

impl TaskHistoryEntry {
    /// Appends an entry to the ledger
    ///
    /// This is the only write operation on the ledger besides the task cascade.
    pub async fn append<'e, E>(
        executor: E,
        user_id: Uuid,
        task_id: Uuid,
        action: HistoryAction,
        action_date: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let entry = sqlx::query_as::<_, TaskHistoryEntry>(
            r#"
            INSERT INTO task_history (user_id, task_id, action, action_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, task_id, action, action_date
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .bind(action.as_str())
        .bind(action_date)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }

    /// Lists entries of a single task, oldest first
    pub async fn list_for_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, TaskHistoryEntry>(
            r#"
            SELECT id, user_id, task_id, action, action_date
            FROM task_history
            WHERE task_id = $1
            ORDER BY action_date ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Lists entries of several tasks joined with actor name and email, oldest first
    pub async fn list_for_tasks(
        pool: &PgPool,
        task_ids: &[Uuid],
    ) -> Result<Vec<HistoryEntryWithActor>, sqlx::Error> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT h.id, h.task_id, h.action, h.action_date,
                   u.id AS user_id, u.name AS user_name, u.email AS user_email
            FROM task_history h
            LEFT JOIN users u ON u.id = h.user_id
            WHERE h.task_id = ANY($1)
            ORDER BY h.action_date ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(HistoryEntryWithActor::from).collect())
    }

    /// Deletes every entry of a task
    pub async fn delete_for_task<'e, E>(executor: E, task_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM task_history WHERE task_id = $1")
            .bind(task_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every entry of every task in a project
    pub async fn delete_for_project<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM task_history
            WHERE task_id IN (SELECT id FROM tasks WHERE project_id = $1)
            "#,
        )
        .bind(project_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Nulls the actor on every entry written by `user_id`
    pub async fn detach_user<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("UPDATE task_history SET user_id = NULL WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
