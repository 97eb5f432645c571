//! HTML fragment endpoints.

use axum::{Router, response::Html, routing::get};
use coursedesk_common::AppResult;

use crate::{extractors::CurrentSession, middleware::AppState, render};

/// The caller's current listing as cards and breadcrumbs.
async fn section(current: CurrentSession) -> AppResult<Html<String>> {
    let session = current.session.lock().await;
    Ok(Html(render::section_fragment(
        &session,
        current.user.is_admin(),
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/section", get(section))
}
