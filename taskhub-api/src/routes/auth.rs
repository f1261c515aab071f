/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Create an account and email a verification link
/// - `GET /auth/verify-email?token=` - Redeem a verification link
/// - `POST /auth/login` - Exchange credentials for an access token

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiQuery, ValidatedJson},
};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    models::user::User,
    services::accounts::{self, Registration},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be between 6 and 128 characters"
    ))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

/// Verification link query
#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

/// Verification response
#[derive(Debug, Serialize)]
pub struct VerifyEmailResponse {
    pub message: String,
    pub user: User,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,

    /// Bearer access token
    pub token: String,
}

/// Registers a new account
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// { "email": "ana@example.com", "password": "secret1", "name": "Ana" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let user = accounts::register(
        &state.db,
        state.mailer.as_ref(),
        &state.accounts,
        Registration {
            email: req.email,
            password: req.password,
            name: req.name,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account created, check your inbox to verify your email".to_string(),
            user,
        }),
    ))
}

/// Marks the account behind a verification token as verified
///
/// # Errors
///
/// - `400 Bad Request`: Token invalid or expired
pub async fn verify_email(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<VerifyEmailQuery>,
) -> ApiResult<Json<VerifyEmailResponse>> {
    let user = accounts::verify_email(&state.db, &state.accounts, &query.token).await?;

    Ok(Json(VerifyEmailResponse {
        message: "Email verified".to_string(),
        user,
    }))
}

/// Logs in with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
/// - `403 Forbidden`: Account not verified while verification is enforced
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let session = accounts::login(&state.db, &state.accounts, &req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        user: session.user,
        token: session.token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            email: "ana@example.com".to_string(),
            password: "secret1".to_string(),
            name: "Ana".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short_password = RegisterRequest {
            password: "abc".to_string(),
            ..valid_request()
        };
        let errors = short_password.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid_request()
        };
        assert!(bad_email.validate().is_err());

        let blank_name = RegisterRequest {
            name: String::new(),
            ..valid_request()
        };
        assert!(blank_name.validate().is_err());
    }

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            email: "ana@example.com".to_string(),
            password: "secret1".to_string(),
            name: "Ana".to_string(),
        }
    }

    #[test]
    fn test_login_request_requires_password() {
        let req = LoginRequest {
            email: "ana@example.com".to_string(),
            password: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
