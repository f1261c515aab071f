/// Database models for TaskHub
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Identity store (accounts, credentials, verification)
/// - `membership`: User-project relationships with roles
/// - `project`: Projects and their leader
/// - `task`: Tasks within projects
/// - `task_history`: Append-only task action ledger
///
/// Model functions return `sqlx::Error`. Functions that take a generic
/// `PgExecutor` are meant to be called inside a transaction (`&mut *tx`).
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::user::{User, CreateUser};
/// use taskhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: "John Doe".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod project;
pub mod task;
pub mod task_history;
pub mod user;
