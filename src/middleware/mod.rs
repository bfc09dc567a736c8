//! Middleware module
//!
//! Contains the authentication and rate limiting stages that run in front
//! of the relay endpoint.

pub mod auth;
pub mod rate_limiter;
