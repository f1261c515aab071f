/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password length policy
/// - [`jwt`]: Access and email verification tokens
/// - [`middleware`]: Bearer token → [`middleware::AuthContext`]
/// - [`authorization`]: Membership-based access decisions
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::auth::password::{hash_password, verify_password};
/// use taskhub_shared::auth::jwt::{create_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("secret1")?;
/// assert!(verify_password("secret1", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
