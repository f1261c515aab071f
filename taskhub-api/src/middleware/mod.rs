/// Middleware for the API server
///
/// - `security`: response hardening headers

pub mod security;
