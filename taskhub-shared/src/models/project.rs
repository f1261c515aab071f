/// Project model and database operations
///
/// Projects group tasks and members. The `lider_id` column points at the
/// account that created the project; it is a display field only, access is
/// always decided by `project_users` membership rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL,
///     description TEXT NOT NULL,
///     lider_id UUID REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::project::{Project, CreateProject};
/// use taskhub_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project = Project::create(&pool, CreateProject {
///     name: "Website".to_string(),
///     description: "Relaunch".to_string(),
///     lider_id: Uuid::new_v4(),
/// }).await?;
///
/// let visible = Project::list_for_user(&pool, project.lider_id.unwrap()).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::membership::ProjectMember;

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    pub name: String,

    pub description: String,

    /// Creator of the project, cleared when that account is deleted
    pub lider_id: Option<Uuid>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: String,

    /// Creating user, recorded as leader
    pub lider_id: Uuid,
}

/// Input for updating a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A project together with its members, as returned by project listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWithMembers {
    #[serde(flatten)]
    pub project: Project,

    pub users: Vec<ProjectMember>,
}

impl Project {
    /// Inserts a project row
    ///
    /// This only writes the `projects` row. Use
    /// `services::projects::create_project` to also insert the OWNER membership
    /// in the same transaction.
    pub async fn create<'e, E>(executor: E, data: CreateProject) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, lider_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, lider_id, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.lider_id)
        .fetch_one(executor)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, lider_id, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Updates name and/or description
    ///
    /// # Returns
    ///
    /// The updated project if found, None if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description, lider_id, created_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Deletes a project row
    ///
    /// Memberships and tasks must already be gone.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears the leader reference on every project led by `user_id`
    ///
    /// # Returns
    ///
    /// Number of projects updated
    pub async fn clear_leader<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("UPDATE projects SET lider_id = NULL WHERE lider_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Lists projects the user leads or is a member of
    ///
    /// A single `WHERE ... OR EXISTS` predicate over `projects`, so a leader who
    /// is also a member appears exactly once.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.name, p.description, p.lider_id, p.created_at
            FROM projects p
            WHERE p.lider_id = $1
               OR EXISTS (
                   SELECT 1 FROM project_users pu
                   WHERE pu.project_id = p.id AND pu.user_id = $1
               )
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }
}
