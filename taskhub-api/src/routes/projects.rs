/// Project endpoints
///
/// All routes require a bearer token. Listing and creation are open to any
/// account; update, delete and member management need the OWNER role in the
/// project.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiPath, ValidatedJson},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::middleware::AuthContext,
    models::{
        membership::Membership,
        project::{Project, ProjectWithMembers},
    },
    services::projects,
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
}

/// Body of `POST /projects/:id/add-user`
#[derive(Debug, Deserialize, Validate)]
pub struct AddUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub user_email: String,

    /// OWNER, WORKER or READER (default)
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectWithMembers>,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub membership: Membership,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Lists projects the caller leads or belongs to, with their members
///
/// ```text
/// GET /projects
/// Authorization: Bearer <token>
/// ```
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProjectListResponse>> {
    let projects = projects::list_projects(&state.db, auth.user_id).await?;

    Ok(Json(ProjectListResponse { projects }))
}

/// Creates a project owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: Missing or blank name/description
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let project =
        projects::create_project(&state.db, auth.user_id, &req.name, &req.description).await?;

    Ok((StatusCode::CREATED, Json(ProjectResponse { project })))
}

/// Updates name and/or description
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an OWNER
/// - `404 Not Found`: Project doesn't exist
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = projects::update_project(
        &state.db,
        auth.user_id,
        project_id,
        req.name,
        req.description,
    )
    .await?;

    Ok(Json(ProjectResponse { project }))
}

/// Deletes the project with its memberships, tasks and history
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    projects::delete_project(&state.db, auth.user_id, project_id).await?;

    Ok(Json(MessageResponse {
        message: "Project deleted".to_string(),
    }))
}

/// Adds a registered account to the project
///
/// ```text
/// POST /projects/:id/add-user
///
/// { "user_email": "bob@example.com", "role": "WORKER" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Already a member, or unknown role
/// - `403 Forbidden`: Caller is not an OWNER
/// - `404 Not Found`: Project or email not found
pub async fn add_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<AddUserRequest>,
) -> ApiResult<(StatusCode, Json<MembershipResponse>)> {
    let membership = projects::add_member(
        &state.db,
        auth.user_id,
        project_id,
        &req.user_email,
        req.role.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(MembershipResponse { membership })))
}
