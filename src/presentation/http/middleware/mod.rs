//! HTTP Middleware

pub mod auth;
pub mod cors;
pub mod logging;

pub use auth::{auth_middleware, AuthSession};
