/// Membership model and database operations
///
/// This module provides the Membership model for user-project relationships with
/// RBAC. A membership row is the authorization fact `(user, project, role)` that
/// every access decision is based on.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('OWNER', 'WORKER', 'READER');
///
/// CREATE TABLE project_users (
///     user_id UUID NOT NULL REFERENCES users(id),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     role project_role NOT NULL DEFAULT 'READER',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (user_id, project_id)
/// );
/// ```
///
/// # Roles
///
/// - **OWNER**: update/delete the project, add members, plus everything WORKER can do
/// - **WORKER**: create, update, delete and assign tasks
/// - **READER**: list tasks
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::membership::{Membership, CreateMembership, ProjectRole};
/// use taskhub_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project_id = Uuid::new_v4();
/// let user_id = Uuid::new_v4();
///
/// // `None` means the user is already a member
/// let membership = Membership::create(&pool, CreateMembership {
///     project_id,
///     user_id,
///     role: ProjectRole::Worker,
/// }).await?;
///
/// let role = Membership::find_role(&pool, project_id, user_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::str::FromStr;
use uuid::Uuid;

/// Project membership roles, in descending privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectRole {
    /// Full control over the project and its members
    Owner,

    /// Can create, update, delete and assign tasks
    Worker,

    /// Read-only access to tasks
    Reader,
}

/// Error returned when parsing a role string outside the closed role set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown project role '{0}', expected one of OWNER, WORKER, READER")]
pub struct UnknownRole(pub String);

impl ProjectRole {
    /// Converts role to its canonical string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "OWNER",
            ProjectRole::Worker => "WORKER",
            ProjectRole::Reader => "READER",
        }
    }

    /// Whether the role may mutate tasks (OWNER or WORKER)
    pub fn can_mutate_tasks(&self) -> bool {
        matches!(self, ProjectRole::Owner | ProjectRole::Worker)
    }

    /// Whether the role may manage the project itself
    pub fn is_owner(&self) -> bool {
        matches!(self, ProjectRole::Owner)
    }
}

impl Default for ProjectRole {
    fn default() -> Self {
        ProjectRole::Reader
    }
}

impl FromStr for ProjectRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OWNER" => Ok(ProjectRole::Owner),
            "WORKER" => Ok(ProjectRole::Worker),
            "READER" => Ok(ProjectRole::Reader),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership model representing a user-project relationship with role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// User ID
    pub user_id: Uuid,

    /// Project ID
    pub project_id: Uuid,

    /// Role within the project
    pub role: ProjectRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to READER)
    #[serde(default)]
    pub role: ProjectRole,
}

/// A project member as shown in project listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    /// Project the membership belongs to
    #[serde(skip_serializing)]
    pub project_id: Uuid,

    /// User ID
    pub id: Uuid,

    pub name: String,

    pub email: String,

    pub profile_image: Option<String>,

    #[serde(rename = "isVerified")]
    pub is_verified: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Role within the project
    pub role: ProjectRole,
}

impl Membership {
    /// Creates a new membership (adds user to project)
    ///
    /// The insert is guarded by the `(user_id, project_id)` primary key with
    /// `ON CONFLICT DO NOTHING`: concurrent duplicate calls yield exactly one row
    /// and the losers observe `None`.
    ///
    /// # Returns
    ///
    /// The new membership, or `None` if the user is already a member
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Project or user doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create<'e, E>(
        executor: E,
        data: CreateMembership,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO project_users (user_id, project_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, project_id) DO NOTHING
            RETURNING user_id, project_id, role, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.project_id)
        .bind(data.role)
        .fetch_optional(executor)
        .await?;

        Ok(membership)
    }

    /// Finds a specific membership by project and user
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT user_id, project_id, role, created_at
            FROM project_users
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Gets user's role in a project
    ///
    /// # Returns
    ///
    /// The user's role if they are a member, None otherwise
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use taskhub_shared::models::membership::Membership;
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(
    /// #     pool: PgPool,
    /// #     project_id: Uuid,
    /// #     user_id: Uuid,
    /// # ) -> Result<(), sqlx::Error> {
    /// if let Some(role) = Membership::find_role(&pool, project_id, user_id).await? {
    ///     println!("User role: {}", role.as_str());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_role(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectRole>, sqlx::Error> {
        let role: Option<ProjectRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM project_users
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Deletes every membership of a project
    pub async fn delete_all_for_project<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM project_users WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every membership of a user
    pub async fn delete_all_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM project_users WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Lists all memberships of a project
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT user_id, project_id, role, created_at
            FROM project_users
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Lists the members of several projects at once, joined with their user rows
    pub async fn list_members(
        pool: &PgPool,
        project_ids: &[Uuid],
    ) -> Result<Vec<ProjectMember>, sqlx::Error> {
        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT pu.project_id, u.id, u.name, u.email, u.profile_image,
                   u.is_verified, u.created_at, pu.role
            FROM project_users pu
            JOIN users u ON u.id = pu.user_id
            WHERE pu.project_id = ANY($1)
            ORDER BY pu.created_at ASC
            "#,
        )
        .bind(project_ids)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_role_as_str() {
        assert_eq!(ProjectRole::Owner.as_str(), "OWNER");
        assert_eq!(ProjectRole::Worker.as_str(), "WORKER");
        assert_eq!(ProjectRole::Reader.as_str(), "READER");
    }

    #[test]
    fn test_role_permissions() {
        assert!(ProjectRole::Owner.can_mutate_tasks());
        assert!(ProjectRole::Owner.is_owner());

        assert!(ProjectRole::Worker.can_mutate_tasks());
        assert!(!ProjectRole::Worker.is_owner());

        assert!(!ProjectRole::Reader.can_mutate_tasks());
        assert!(!ProjectRole::Reader.is_owner());
    }

    #[test]
    fn test_default_role_is_reader() {
        assert_eq!(ProjectRole::default(), ProjectRole::Reader);

        let data: CreateMembership = serde_json::from_value(serde_json::json!({
            "project_id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
        }))
        .unwrap();
        assert_eq!(data.role, ProjectRole::Reader);
    }

    #[test]
    fn test_parse_role() {
        assert_eq!("OWNER".parse::<ProjectRole>(), Ok(ProjectRole::Owner));
        assert_eq!("worker".parse::<ProjectRole>(), Ok(ProjectRole::Worker));
        assert_eq!(" Reader ".parse::<ProjectRole>(), Ok(ProjectRole::Reader));
    }

    #[test]
    fn test_parse_role_rejects_unknown_values() {
        let err = "WOKER".parse::<ProjectRole>().unwrap_err();
        assert_eq!(err, UnknownRole("WOKER".to_string()));
        assert!(err.to_string().contains("WOKER"));

        assert!("ADMIN".parse::<ProjectRole>().is_err());
        assert!("".parse::<ProjectRole>().is_err());
    }

    #[test]
    fn test_role_serde_uses_canonical_names() {
        assert_eq!(serde_json::to_value(ProjectRole::Worker).unwrap(), "WORKER");
        let role: ProjectRole = serde_json::from_value(serde_json::json!("OWNER")).unwrap();
        assert_eq!(role, ProjectRole::Owner);
    }
}
