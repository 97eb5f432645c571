//! Navigation endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::post,
};
use coursedesk_common::{AppError, AppResult};
use coursedesk_core::{HistoryEntry, View};
use coursedesk_db::entities::user;
use serde::Deserialize;

use crate::{
    extractors::CurrentSession,
    middleware::AppState,
    response::{FormatParams, SessionView},
};

/// Activate view request.
#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub view: String,
}

/// Open folder request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRequest {
    /// `None` returns to the section root.
    pub folder_id: Option<String>,
    /// Set when a breadcrumb was clicked.
    pub breadcrumb_index: Option<usize>,
    pub title: Option<String>,
}

/// Replay request, sent when the browser pops its own history.
#[derive(Debug, Default, Deserialize)]
pub struct ReplayRequest {
    pub entry: Option<HistoryEntry>,
}

fn check_view(user: &user::Model, view: View) -> AppResult<()> {
    if view == View::Students && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can manage students".to_string(),
        ));
    }
    Ok(())
}

async fn activate(
    current: CurrentSession,
    State(state): State<AppState>,
    Query(format): Query<FormatParams>,
    Json(req): Json<ActivateRequest>,
) -> AppResult<SessionView> {
    let view = View::parse(&req.view)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown view: {}", req.view)))?;
    check_view(&current.user, view)?;

    let mut session = current.session.lock().await;
    state.navigator.activate(&mut session, view, false).await?;

    Ok(SessionView::render(&session, &format, current.user.is_admin()))
}

async fn folder(
    current: CurrentSession,
    State(state): State<AppState>,
    Query(format): Query<FormatParams>,
    Json(req): Json<FolderRequest>,
) -> AppResult<SessionView> {
    let folder_id = req.folder_id.filter(|id| !id.is_empty());

    let mut session = current.session.lock().await;
    state
        .navigator
        .navigate(
            &mut session,
            folder_id.as_deref(),
            req.breadcrumb_index,
            req.title.as_deref(),
            false,
        )
        .await?;

    Ok(SessionView::render(&session, &format, current.user.is_admin()))
}

async fn back(
    current: CurrentSession,
    State(state): State<AppState>,
    Query(format): Query<FormatParams>,
) -> AppResult<SessionView> {
    let mut session = current.session.lock().await;
    state.navigator.back(&mut session).await?;
    Ok(SessionView::render(&session, &format, current.user.is_admin()))
}

async fn forward(
    current: CurrentSession,
    State(state): State<AppState>,
    Query(format): Query<FormatParams>,
) -> AppResult<SessionView> {
    let mut session = current.session.lock().await;
    state.navigator.forward(&mut session).await?;
    Ok(SessionView::render(&session, &format, current.user.is_admin()))
}

async fn replay(
    current: CurrentSession,
    State(state): State<AppState>,
    Query(format): Query<FormatParams>,
    Json(req): Json<ReplayRequest>,
) -> AppResult<SessionView> {
    if let Some(HistoryEntry::Tab { view }) = &req.entry {
        check_view(&current.user, *view)?;
    }

    let mut session = current.session.lock().await;
    state.navigator.replay(&mut session, req.entry).await?;

    Ok(SessionView::render(&session, &format, current.user.is_admin()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activate", post(activate))
        .route("/folder", post(folder))
        .route("/back", post(back))
        .route("/forward", post(forward))
        .route("/replay", post(replay))
}
