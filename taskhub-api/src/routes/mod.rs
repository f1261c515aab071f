/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, email verification and login
/// - `projects`: Projects and their members
/// - `tasks`: Tasks, their history and assignment
/// - `users`: The authenticated account

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;
