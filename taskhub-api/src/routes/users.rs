/// Endpoints of the authenticated account
///
/// - `GET /user` - Current account
/// - `PUT /user` - Change name and/or password
/// - `DELETE /user` - Delete the account and detach it from every project
/// - `PUT /user/profile-image` - Upload a profile image (multipart field `image`)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiMultipart, ValidatedJson},
};
use axum::{
    extract::State,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::middleware::AuthContext,
    models::user::User,
    services::accounts::{self, ProfileChanges},
};
use validator::Validate;

/// Multipart field carrying the upload
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,

    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be between 6 and 128 characters"
    ))]
    pub password: Option<String>,

    /// Accepted only when unchanged
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn get_profile(Extension(auth): Extension<AuthContext>) -> Json<UserResponse> {
    Json(UserResponse { user: auth.user })
}

/// Updates the caller's profile
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or a different email was sent
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = accounts::update_profile(
        &state.db,
        &auth.user,
        ProfileChanges {
            name: req.name,
            password: req.password,
            email: req.email,
        },
    )
    .await?;

    Ok(Json(UserResponse { user }))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    accounts::delete_account(&state.db, state.storage.as_ref(), &auth.user).await?;

    Ok(Json(MessageResponse {
        message: "Account deleted".to_string(),
    }))
}

/// Replaces the caller's profile image
///
/// # Errors
///
/// - `400 Bad Request`: No `image` field, unsupported type or file too large
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiMultipart(mut multipart): ApiMultipart,
) -> ApiResult<Json<UserResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        if data.is_empty() {
            break;
        }

        let user = accounts::replace_profile_image(
            &state.db,
            state.storage.as_ref(),
            &auth.user,
            &content_type,
            data,
        )
        .await?;

        return Ok(Json(UserResponse { user }));
    }

    Err(ApiError::BadRequest("An image file is required".to_string()))
}
