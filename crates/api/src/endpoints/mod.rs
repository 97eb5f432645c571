//! API endpoints.

mod content;
mod courses;
mod fragments;
mod nav;
mod session;
mod students;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(session::router())
        .nest("/nav", nav::router())
        .nest("/content", content::router())
        .nest("/courses", courses::router())
        .nest("/students", students::router())
        .nest("/fragments", fragments::router())
}
