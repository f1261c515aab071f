/// Project lifecycle and membership
///
/// The creator of a project becomes its OWNER in the same transaction that
/// inserts the project. Deleting a project removes its task history, tasks and
/// memberships before the project row, also in one transaction.

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::authorization::{authorize_project, ProjectAction};
use crate::error::{CoreError, CoreResult};
use crate::models::membership::{CreateMembership, Membership, ProjectMember, ProjectRole};
use crate::models::project::{CreateProject, Project, ProjectWithMembers, UpdateProject};
use crate::models::task::Task;
use crate::models::task_history::TaskHistoryEntry;
use crate::models::user::User;
use crate::services::{optional_text, required_text};

/// Creates a project led by `actor_id`, who becomes its OWNER
///
/// # Errors
///
/// `Validation` if name or description is blank
pub async fn create_project(
    pool: &PgPool,
    actor_id: Uuid,
    name: &str,
    description: &str,
) -> CoreResult<Project> {
    let name = required_text("name", name)?;
    let description = required_text("description", description)?;

    let mut tx = pool.begin().await?;

    let project = Project::create(
        &mut *tx,
        CreateProject {
            name,
            description,
            lider_id: actor_id,
        },
    )
    .await?;

    Membership::create(
        &mut *tx,
        CreateMembership {
            project_id: project.id,
            user_id: actor_id,
            role: ProjectRole::Owner,
        },
    )
    .await?
    .ok_or_else(|| CoreError::Internal("Owner membership already existed".to_string()))?;

    tx.commit().await?;

    info!(project_id = %project.id, owner_id = %actor_id, "Project created");
    Ok(project)
}

/// Lists every project the actor leads or belongs to, with their members
pub async fn list_projects(pool: &PgPool, actor_id: Uuid) -> CoreResult<Vec<ProjectWithMembers>> {
    let projects = Project::list_for_user(pool, actor_id).await?;
    if projects.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();

    let mut members: HashMap<Uuid, Vec<ProjectMember>> = HashMap::new();
    for member in Membership::list_members(pool, &ids).await? {
        members.entry(member.project_id).or_default().push(member);
    }

    Ok(projects
        .into_iter()
        .map(|project| ProjectWithMembers {
            users: members.remove(&project.id).unwrap_or_default(),
            project,
        })
        .collect())
}

/// Renames and/or re-describes a project (OWNER only)
///
/// # Errors
///
/// - `NotFound` if the project doesn't exist
/// - `Forbidden` unless the actor is an OWNER
/// - `Validation` if a provided field is blank
pub async fn update_project(
    pool: &PgPool,
    actor_id: Uuid,
    project_id: Uuid,
    name: Option<String>,
    description: Option<String>,
) -> CoreResult<Project> {
    authorize_project(pool, actor_id, project_id, ProjectAction::UpdateProject).await?;

    let patch = UpdateProject {
        name: optional_text("name", name)?,
        description: optional_text("description", description)?,
    };

    Project::update(pool, project_id, patch)
        .await?
        .ok_or_else(|| CoreError::NotFound("Project not found".to_string()))
}

/// Deletes a project with its tasks, history and memberships (OWNER only)
pub async fn delete_project(pool: &PgPool, actor_id: Uuid, project_id: Uuid) -> CoreResult<()> {
    authorize_project(pool, actor_id, project_id, ProjectAction::DeleteProject).await?;

    let mut tx = pool.begin().await?;

    let history = TaskHistoryEntry::delete_for_project(&mut *tx, project_id).await?;
    let tasks = Task::delete_all_for_project(&mut *tx, project_id).await?;
    let memberships = Membership::delete_all_for_project(&mut *tx, project_id).await?;

    if !Project::delete(&mut *tx, project_id).await? {
        return Err(CoreError::NotFound("Project not found".to_string()));
    }

    tx.commit().await?;

    info!(
        project_id = %project_id,
        tasks,
        history_entries = history,
        memberships,
        "Project deleted"
    );
    Ok(())
}

/// Adds the account registered under `user_email` to a project (OWNER only)
///
/// `role` defaults to READER.
///
/// # Errors
///
/// - `NotFound` if the project or the email doesn't resolve
/// - `Forbidden` unless the actor is an OWNER
/// - `Validation` for a role outside OWNER/WORKER/READER
/// - `Conflict` if the user is already a member
pub async fn add_member(
    pool: &PgPool,
    actor_id: Uuid,
    project_id: Uuid,
    user_email: &str,
    role: Option<&str>,
) -> CoreResult<Membership> {
    authorize_project(pool, actor_id, project_id, ProjectAction::AddMember).await?;

    let role = match role {
        Some(role) => role
            .parse::<ProjectRole>()
            .map_err(|e| CoreError::Validation(e.to_string()))?,
        None => ProjectRole::default(),
    };

    let user = User::find_by_email(pool, user_email)
        .await?
        .ok_or_else(|| CoreError::NotFound("User not found".to_string()))?;

    let membership = Membership::create(
        pool,
        CreateMembership {
            project_id,
            user_id: user.id,
            role,
        },
    )
    .await?
    .ok_or_else(|| CoreError::Conflict("User is already a member of this project".to_string()))?;

    info!(
        project_id = %project_id,
        user_id = %user.id,
        role = role.as_str(),
        "Member added"
    );
    Ok(membership)
}
