/// Domain error taxonomy
///
/// Services return [`CoreResult`]. The HTTP layer maps each variant to a status
/// code; `Internal` carries detail for the logs only.

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::storage::StorageError;

/// Result alias for service operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by service operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credential
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Resource id does not resolve
    #[error("{0}")]
    NotFound(String),

    /// Duplicate email or membership
    #[error("{0}")]
    Conflict(String),

    /// Datastore, transport or other unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::Internal(format!("Database error: {}", err))
    }
}

impl From<AuthzError> for CoreError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) | AuthzError::InsufficientRole { .. } => {
                CoreError::Forbidden("Insufficient permissions for this project".to_string())
            }
            AuthzError::AssigneeNotEligible(_) => CoreError::Forbidden(
                "Tasks can only be assigned to project owners and workers".to_string(),
            ),
            AuthzError::ProjectNotFound(_) => CoreError::NotFound("Project not found".to_string()),
            AuthzError::TaskNotFound(_) => CoreError::NotFound("Task not found".to_string()),
            AuthzError::DatabaseError(err) => err.into(),
        }
    }
}

impl From<PasswordError> for CoreError {
    fn from(err: PasswordError) -> Self {
        CoreError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for CoreError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => CoreError::Internal(msg),
            other => CoreError::Unauthorized(other.to_string()),
        }
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsupportedType(_) | StorageError::TooLarge { .. } => {
                CoreError::Validation(err.to_string())
            }
            StorageError::Io(_) => CoreError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_authz_mapping() {
        let id = Uuid::new_v4();

        assert!(matches!(
            CoreError::from(AuthzError::NotMember(id)),
            CoreError::Forbidden(_)
        ));
        assert!(matches!(
            CoreError::from(AuthzError::AssigneeNotEligible(id)),
            CoreError::Forbidden(_)
        ));
        assert!(matches!(
            CoreError::from(AuthzError::ProjectNotFound(id)),
            CoreError::NotFound(_)
        ));
        assert!(matches!(
            CoreError::from(AuthzError::TaskNotFound(id)),
            CoreError::NotFound(_)
        ));
        assert!(matches!(
            CoreError::from(AuthzError::DatabaseError(sqlx::Error::PoolTimedOut)),
            CoreError::Internal(_)
        ));
    }

    #[test]
    fn test_jwt_mapping() {
        assert!(matches!(
            CoreError::from(JwtError::Expired),
            CoreError::Unauthorized(_)
        ));
        assert!(matches!(
            CoreError::from(JwtError::CreateError("boom".to_string())),
            CoreError::Internal(_)
        ));
    }

    #[test]
    fn test_storage_mapping() {
        assert!(matches!(
            CoreError::from(StorageError::UnsupportedType("text/plain".to_string())),
            CoreError::Validation(_)
        ));
        assert!(matches!(
            CoreError::from(StorageError::Io(std::io::Error::other("disk"))),
            CoreError::Internal(_)
        ));
    }

    #[test]
    fn test_display_is_message() {
        let err = CoreError::Conflict("Email already registered".to_string());
        assert_eq!(err.to_string(), "Email already registered");
    }
}
