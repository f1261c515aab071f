//! # TaskHub Shared Library
//!
//! This crate contains the domain types, persistence, and business rules used
//! by the TaskHub API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and repository-style queries
//! - `auth`: Password hashing, JWT tokens, authorization engine, request authentication
//! - `services`: Registry operations that combine authorization, persistence and history
//! - `mail`: Verification email transport
//! - `storage`: Uploaded file storage
//! - `db`: Connection pool and migrations
//! - `error`: Domain error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod mail;
pub mod models;
pub mod services;
pub mod storage;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
