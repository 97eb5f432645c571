//! HTTP API layer for coursedesk.
//!
//! This crate exposes the dashboard over HTTP:
//!
//! - **Endpoints**: sessions, navigation, content, courses and student approvals
//! - **Extractors**: authenticated user, admin guard, per-client navigation session
//! - **Middleware**: bearer-token authentication
//! - **Rendering**: HTML fragments of the current listing
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod render;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
