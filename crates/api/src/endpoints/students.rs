//! Student approval endpoints.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::post,
};
use coursedesk_common::AppResult;
use coursedesk_db::entities::user;
use serde::Deserialize;

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Request naming one student.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentIdRequest {
    pub user_id: String,
}

/// Roster request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRequest {
    pub course_id: String,
}

async fn pending(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<user::Model>>> {
    Ok(ApiResponse::ok(state.student_service.list_pending().await?))
}

async fn approve(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<StudentIdRequest>,
) -> AppResult<ApiResponse<user::Model>> {
    let student = state.student_service.approve(&req.user_id).await?;
    tracing::debug!(admin_id = %admin.id, user_id = %student.id, "Student approved by admin");
    Ok(ApiResponse::ok(student))
}

async fn roster(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<RosterRequest>,
) -> AppResult<ApiResponse<Vec<user::Model>>> {
    Ok(ApiResponse::ok(
        state
            .student_service
            .list_course_students(&req.course_id)
            .await?,
    ))
}

/// Delete a student and drop their navigation sessions.
async fn delete(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<StudentIdRequest>,
) -> AppResult<impl IntoResponse> {
    state.student_service.delete_student(&req.user_id).await?;
    state.sessions.remove_user(&req.user_id).await;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(roster))
        .route("/pending", post(pending))
        .route("/approve", post(approve))
        .route("/delete", post(delete))
}
