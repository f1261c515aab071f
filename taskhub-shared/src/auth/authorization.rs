/// Authorization engine for project and task access
///
/// Every access decision is based on the actor's membership row in the target
/// project. The project's `lider_id` is never consulted.
///
/// # Permission Model
///
/// | Tier   | Roles                  | Actions                                         |
/// |--------|------------------------|-------------------------------------------------|
/// | Read   | OWNER, WORKER, READER  | list tasks                                      |
/// | Mutate | OWNER, WORKER          | create, update, delete and assign tasks         |
/// | Own    | OWNER                  | update and delete the project, add members      |
///
/// A missing membership row denies exactly like an insufficient role.
///
/// # Ordering
///
/// The async entry points look the target resource up first and only then
/// check membership: an unknown id is always `NotFound`, whatever the caller's
/// role. Each check issues one resource lookup and one membership lookup.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::auth::authorization::{authorize_project, ProjectAction};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// async fn rename(
///     pool: &PgPool,
///     actor: Uuid,
///     project_id: Uuid,
/// ) -> Result<(), Box<dyn std::error::Error>> {
///     let (project, role) =
///         authorize_project(pool, actor, project_id, ProjectAction::UpdateProject).await?;
///     println!("{} may rename {} as {}", actor, project.name, role);
///     Ok(())
/// }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::{Membership, ProjectRole};
use crate::models::project::Project;
use crate::models::task::Task;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Actor has no membership row in the project
    #[error("Not a member of project {0}")]
    NotMember(Uuid),

    /// Actor's role is below the tier the action needs
    #[error("Insufficient permissions: requires {required:?} tier, has {actual}")]
    InsufficientRole { required: Tier, actual: ProjectRole },

    /// Assignment target is not a WORKER or OWNER of the project
    #[error("User {0} cannot be assigned tasks in this project")]
    AssigneeNotEligible(Uuid),

    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),

    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Role tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Any membership row
    Read,

    /// OWNER or WORKER
    Mutate,

    /// OWNER only
    Own,
}

impl Tier {
    /// Whether `role` belongs to this tier
    pub fn admits(&self, role: ProjectRole) -> bool {
        match self {
            Tier::Read => true,
            Tier::Mutate => role.can_mutate_tasks(),
            Tier::Own => role.is_owner(),
        }
    }
}

/// Actions guarded by project membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    ViewTasks,
    CreateTask,
    UpdateTask,
    DeleteTask,
    AssignTask,
    UpdateProject,
    DeleteProject,
    AddMember,
}

impl ProjectAction {
    /// Gets the tier required for this action
    pub fn tier(&self) -> Tier {
        match self {
            ProjectAction::ViewTasks => Tier::Read,
            ProjectAction::CreateTask
            | ProjectAction::UpdateTask
            | ProjectAction::DeleteTask
            | ProjectAction::AssignTask => Tier::Mutate,
            ProjectAction::UpdateProject
            | ProjectAction::DeleteProject
            | ProjectAction::AddMember => Tier::Own,
        }
    }
}

/// Pure decision: may a holder of `role` perform `action`?
///
/// `None` means the actor has no membership row and is always denied.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::authorization::{can, ProjectAction};
/// use taskhub_shared::models::membership::ProjectRole;
///
/// assert!(can(Some(ProjectRole::Worker), ProjectAction::CreateTask));
/// assert!(!can(Some(ProjectRole::Reader), ProjectAction::CreateTask));
/// assert!(!can(None, ProjectAction::ViewTasks));
/// ```
pub fn can(role: Option<ProjectRole>, action: ProjectAction) -> bool {
    role.map_or(false, |role| action.tier().admits(role))
}

/// Like [`can`], but explains a denial
pub fn check(
    role: Option<ProjectRole>,
    action: ProjectAction,
    project_id: Uuid,
) -> Result<ProjectRole, AuthzError> {
    let role = role.ok_or(AuthzError::NotMember(project_id))?;
    let required = action.tier();

    if !required.admits(role) {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: role,
        });
    }

    Ok(role)
}

/// Resolves a project and checks the actor may perform `action` on it
///
/// # Errors
///
/// - `ProjectNotFound` if the project doesn't exist
/// - `NotMember` / `InsufficientRole` if the actor is denied
pub async fn authorize_project(
    pool: &PgPool,
    actor_id: Uuid,
    project_id: Uuid,
    action: ProjectAction,
) -> Result<(Project, ProjectRole), AuthzError> {
    let project = Project::find_by_id(pool, project_id)
        .await?
        .ok_or(AuthzError::ProjectNotFound(project_id))?;

    let role = Membership::find_role(pool, project.id, actor_id).await?;
    let role = check(role, action, project.id)?;

    Ok((project, role))
}

/// Resolves a task and checks the actor may perform `action` on its project
///
/// # Errors
///
/// - `TaskNotFound` if the task doesn't exist
/// - `NotMember` / `InsufficientRole` if the actor is denied
pub async fn authorize_task(
    pool: &PgPool,
    actor_id: Uuid,
    task_id: Uuid,
    action: ProjectAction,
) -> Result<(Task, ProjectRole), AuthzError> {
    let task = Task::find_by_id(pool, task_id)
        .await?
        .ok_or(AuthzError::TaskNotFound(task_id))?;

    let role = Membership::find_role(pool, task.project_id, actor_id).await?;
    let role = check(role, action, task.project_id)?;

    Ok((task, role))
}

/// Checks a user may be the assignee of tasks in a project
///
/// Only the mutation tier qualifies; READERs and non-members are rejected.
pub async fn require_assignable(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<ProjectRole, AuthzError> {
    match Membership::find_role(pool, project_id, user_id).await? {
        Some(role) if Tier::Mutate.admits(role) => Ok(role),
        _ => Err(AuthzError::AssigneeNotEligible(user_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [ProjectAction; 8] = [
        ProjectAction::ViewTasks,
        ProjectAction::CreateTask,
        ProjectAction::UpdateTask,
        ProjectAction::DeleteTask,
        ProjectAction::AssignTask,
        ProjectAction::UpdateProject,
        ProjectAction::DeleteProject,
        ProjectAction::AddMember,
    ];

    #[test]
    fn test_action_tiers() {
        assert_eq!(ProjectAction::ViewTasks.tier(), Tier::Read);
        assert_eq!(ProjectAction::CreateTask.tier(), Tier::Mutate);
        assert_eq!(ProjectAction::AssignTask.tier(), Tier::Mutate);
        assert_eq!(ProjectAction::DeleteProject.tier(), Tier::Own);
        assert_eq!(ProjectAction::AddMember.tier(), Tier::Own);
    }

    #[test]
    fn test_owner_can_do_everything() {
        for action in ALL_ACTIONS {
            assert!(can(Some(ProjectRole::Owner), action), "{:?}", action);
        }
    }

    #[test]
    fn test_non_member_can_do_nothing() {
        for action in ALL_ACTIONS {
            assert!(!can(None, action), "{:?}", action);
        }
    }

    #[test]
    fn test_mutation_iff_owner_or_worker() {
        for action in ALL_ACTIONS.into_iter().filter(|a| a.tier() == Tier::Mutate) {
            assert!(can(Some(ProjectRole::Owner), action));
            assert!(can(Some(ProjectRole::Worker), action));
            assert!(!can(Some(ProjectRole::Reader), action));
            assert!(!can(None, action));
        }
    }

    #[test]
    fn test_reader_can_only_view() {
        assert!(can(Some(ProjectRole::Reader), ProjectAction::ViewTasks));
        for action in ALL_ACTIONS
            .into_iter()
            .filter(|a| *a != ProjectAction::ViewTasks)
        {
            assert!(!can(Some(ProjectRole::Reader), action), "{:?}", action);
        }
    }

    #[test]
    fn test_worker_cannot_manage_project() {
        assert!(!can(Some(ProjectRole::Worker), ProjectAction::UpdateProject));
        assert!(!can(Some(ProjectRole::Worker), ProjectAction::DeleteProject));
        assert!(!can(Some(ProjectRole::Worker), ProjectAction::AddMember));
    }

    #[test]
    fn test_check_explains_denial() {
        let project_id = Uuid::new_v4();

        assert!(matches!(
            check(None, ProjectAction::ViewTasks, project_id),
            Err(AuthzError::NotMember(id)) if id == project_id
        ));

        assert!(matches!(
            check(Some(ProjectRole::Reader), ProjectAction::UpdateProject, project_id),
            Err(AuthzError::InsufficientRole {
                required: Tier::Own,
                actual: ProjectRole::Reader,
            })
        ));

        assert_eq!(
            check(Some(ProjectRole::Worker), ProjectAction::DeleteTask, project_id).unwrap(),
            ProjectRole::Worker
        );
    }

    #[test]
    fn test_authz_error_display() {
        let id = Uuid::new_v4();
        assert!(AuthzError::NotMember(id).to_string().contains("Not a member"));
        assert!(AuthzError::ProjectNotFound(id).to_string().contains("not found"));
        assert!(AuthzError::AssigneeNotEligible(id)
            .to_string()
            .contains("cannot be assigned"));
    }
}
