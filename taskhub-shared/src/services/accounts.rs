/// Account lifecycle
///
/// Registration creates an unverified user and mails a one-hour verification
/// link. Login does not require verification unless
/// [`AccountSettings::require_verified_login`] is set.
///
/// Deleting an account clears every reference to it in one transaction:
/// leadership of projects, task assignments, history actors and memberships.
/// The stored profile image is removed afterwards, best-effort.

use chrono::Duration;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{jwt, password};
use crate::error::{CoreError, CoreResult};
use crate::mail::{verification_email, Mailer};
use crate::models::membership::Membership;
use crate::models::project::Project;
use crate::models::task::Task;
use crate::models::task_history::TaskHistoryEntry;
use crate::models::user::{normalize_email, CreateUser, UpdateUser, User};
use crate::services::{optional_text, required_text};
use crate::storage::{discard, FileStore};

/// Token and login settings
#[derive(Debug, Clone)]
pub struct AccountSettings {
    /// HS256 signing secret
    pub jwt_secret: String,

    /// Lifetime of access tokens
    pub access_token_ttl: Duration,

    /// Base URL the verification link points at
    pub public_url: String,

    /// Reject logins of unverified accounts
    pub require_verified_login: bool,
}

impl AccountSettings {
    /// Full verification link for `token`
    pub fn verification_link(&self, token: &str) -> String {
        format!(
            "{}/auth/verify-email?token={}",
            self.public_url.trim_end_matches('/'),
            token
        )
    }
}

/// Registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Profile changes requested by the account holder
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub password: Option<String>,

    /// Only accepted when equal to the current address
    pub email: Option<String>,
}

/// Successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Registers a new unverified account and sends the verification link
///
/// A mail delivery failure is logged; the account is still created.
///
/// # Errors
///
/// - `Validation` for a blank name or a password outside the length policy
/// - `Conflict` if the email is already registered
pub async fn register(
    pool: &PgPool,
    mailer: &dyn Mailer,
    settings: &AccountSettings,
    input: Registration,
) -> CoreResult<User> {
    let name = required_text("name", &input.name)?;
    let email = normalize_email(&input.email);
    if email.is_empty() {
        return Err(CoreError::Validation("email is required".to_string()));
    }
    password::validate_password(&input.password).map_err(CoreError::Validation)?;

    let password_hash = password::hash_password(&input.password)?;

    let user = User::create(
        pool,
        CreateUser {
            email,
            password_hash,
            name,
        },
    )
    .await?
    .ok_or_else(|| CoreError::Conflict("Email already registered".to_string()))?;

    info!(user_id = %user.id, "User registered");

    let token = jwt::issue_verification_token(user.id, &settings.jwt_secret)?;
    let mail = verification_email(&user.email, &user.name, &settings.verification_link(&token));
    if let Err(e) = mailer.send(mail).await {
        warn!(user_id = %user.id, error = %e, "Failed to send verification email");
    }

    Ok(user)
}

/// Redeems a verification token
///
/// Redeeming a token of an already verified account succeeds again.
///
/// # Errors
///
/// `Validation` if the token is invalid, expired, of the wrong type or its
/// account no longer exists
pub async fn verify_email(
    pool: &PgPool,
    settings: &AccountSettings,
    token: &str,
) -> CoreResult<User> {
    let claims = jwt::validate_verification_token(token, &settings.jwt_secret).map_err(|e| {
        CoreError::Validation(match e {
            jwt::JwtError::Expired => "Verification token has expired".to_string(),
            _ => "Invalid verification token".to_string(),
        })
    })?;

    let user = User::mark_verified(pool, claims.sub)
        .await?
        .ok_or_else(|| CoreError::Validation("Invalid verification token".to_string()))?;

    info!(user_id = %user.id, "Email verified");
    Ok(user)
}

/// Checks credentials and issues an access token
///
/// # Errors
///
/// - `Unauthorized` for an unknown email or wrong password
/// - `Forbidden` for an unverified account when verification is required
pub async fn login(
    pool: &PgPool,
    settings: &AccountSettings,
    email: &str,
    password: &str,
) -> CoreResult<Session> {
    let invalid = || CoreError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(pool, email).await?.ok_or_else(invalid)?;

    if !password::verify_password(password, &user.password_hash)? {
        return Err(invalid());
    }

    if settings.require_verified_login && !user.is_verified {
        return Err(CoreError::Forbidden(
            "Email address has not been verified".to_string(),
        ));
    }

    let token = jwt::issue_access_token(user.id, &settings.jwt_secret, settings.access_token_ttl)?;

    info!(user_id = %user.id, "User logged in");
    Ok(Session { user, token })
}

/// Updates name and/or password of the account holder
///
/// # Errors
///
/// `Validation` for a blank name, a password outside the length policy, or an
/// attempt to change the email address
pub async fn update_profile(
    pool: &PgPool,
    user: &User,
    changes: ProfileChanges,
) -> CoreResult<User> {
    if let Some(email) = &changes.email {
        if normalize_email(email) != user.email {
            return Err(CoreError::Validation(
                "Email address cannot be changed".to_string(),
            ));
        }
    }

    let name = optional_text("name", changes.name)?;

    let password_hash = match changes.password {
        Some(new_password) => {
            password::validate_password(&new_password).map_err(CoreError::Validation)?;
            Some(password::hash_password(&new_password)?)
        }
        None => None,
    };

    User::update(pool, user.id, UpdateUser { name, password_hash })
        .await?
        .ok_or_else(|| CoreError::NotFound("User not found".to_string()))
}

/// Stores a new profile image and removes the previous one
pub async fn replace_profile_image(
    pool: &PgPool,
    store: &dyn FileStore,
    user: &User,
    content_type: &str,
    data: bytes::Bytes,
) -> CoreResult<User> {
    let uri = store.save(content_type, data).await?;

    let updated = match User::set_profile_image(pool, user.id, Some(&uri)).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            discard(store, &uri).await;
            return Err(CoreError::NotFound("User not found".to_string()));
        }
        Err(e) => {
            discard(store, &uri).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = &user.profile_image {
        discard(store, previous).await;
    }

    Ok(updated)
}

/// Deletes the account and every reference to it
pub async fn delete_account(pool: &PgPool, store: &dyn FileStore, user: &User) -> CoreResult<()> {
    let user_id: Uuid = user.id;
    let mut tx = pool.begin().await?;

    let led = Project::clear_leader(&mut *tx, user_id).await?;
    let unassigned = Task::unassign_user(&mut *tx, user_id).await?;
    TaskHistoryEntry::detach_user(&mut *tx, user_id).await?;
    let memberships = Membership::delete_all_for_user(&mut *tx, user_id).await?;

    if !User::delete(&mut *tx, user_id).await? {
        return Err(CoreError::NotFound("User not found".to_string()));
    }

    tx.commit().await?;

    info!(
        user_id = %user_id,
        led_projects = led,
        unassigned_tasks = unassigned,
        memberships,
        "Account deleted"
    );

    if let Some(image) = &user.profile_image {
        discard(store, image).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AccountSettings {
        AccountSettings {
            jwt_secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            access_token_ttl: Duration::hours(24),
            public_url: "http://localhost:8080/".to_string(),
            require_verified_login: false,
        }
    }

    #[test]
    fn test_verification_link() {
        assert_eq!(
            settings().verification_link("abc"),
            "http://localhost:8080/auth/verify-email?token=abc"
        );
    }

    #[tokio::test]
    async fn test_verify_email_rejects_access_token_before_touching_db() {
        let settings = settings();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://nobody@127.0.0.1:1/none")
            .unwrap();

        let access =
            jwt::issue_access_token(Uuid::new_v4(), &settings.jwt_secret, Duration::hours(1))
                .unwrap();

        let result = verify_email(&pool, &settings, &access).await;
        assert!(matches!(
            result,
            Err(CoreError::Validation(msg)) if msg == "Invalid verification token"
        ));

        let result = verify_email(&pool, &settings, "garbage").await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }
}
