//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use coursedesk_core::{NavigationSession, SessionSnapshot};
use serde::{Deserialize, Serialize};

use crate::render;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Empty success response.
#[must_use]
pub fn ok() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// `?format=` query accepted by navigation and listing routes.
#[derive(Debug, Default, Deserialize)]
pub struct FormatParams {
    #[serde(default)]
    pub format: Option<String>,
}

impl FormatParams {
    /// Whether the caller asked for an HTML fragment.
    #[must_use]
    pub fn wants_html(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("html"))
    }
}

/// A session rendered either as a JSON snapshot or as an HTML fragment.
pub enum SessionView {
    Snapshot(ApiResponse<SessionSnapshot>),
    Fragment(Html<String>),
}

impl SessionView {
    #[must_use]
    pub fn render(session: &NavigationSession, format: &FormatParams, is_admin: bool) -> Self {
        if format.wants_html() {
            Self::Fragment(Html(render::section_fragment(session, is_admin)))
        } else {
            Self::Snapshot(ApiResponse::ok(session.snapshot()))
        }
    }
}

impl IntoResponse for SessionView {
    fn into_response(self) -> Response {
        match self {
            Self::Snapshot(snapshot) => snapshot.into_response(),
            Self::Fragment(html) => html.into_response(),
        }
    }
}
