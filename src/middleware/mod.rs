//! HTTP middleware and extractors
//!
//! - `AuthUser` extractor for endpoints that require a bearer token
//! - `OptionalAuth` for public endpoints that personalise their output

pub mod auth;

pub use auth::{AuthUser, OptionalAuth};
