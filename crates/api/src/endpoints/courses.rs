//! Course endpoints.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::post,
};
use coursedesk_common::{AppError, AppResult};
use coursedesk_core::CourseInput;
use coursedesk_db::entities::course;
use serde::Deserialize;

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Create course request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub sub_groups: Vec<String>,
}

/// Update course request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub sub_groups: Vec<String>,
}

/// Request naming one course.
#[derive(Debug, Deserialize)]
pub struct CourseIdRequest {
    pub id: String,
}

/// Courses visible to the caller: all of them for admins, the enrolled one
/// for students.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<course::Model>>> {
    if user.is_admin() {
        return Ok(ApiResponse::ok(state.course_service.list().await?));
    }

    let courses = match user.course_id.as_deref() {
        Some(course_id) => vec![state.course_service.get(course_id).await?],
        None => Vec::new(),
    };
    Ok(ApiResponse::ok(courses))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CourseIdRequest>,
) -> AppResult<ApiResponse<course::Model>> {
    if !user.is_admin() && user.course_id.as_deref() != Some(req.id.as_str()) {
        return Err(AppError::NotFound(format!("Course {}", req.id)));
    }
    Ok(ApiResponse::ok(state.course_service.get(&req.id).await?))
}

async fn create(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCourseRequest>,
) -> AppResult<ApiResponse<course::Model>> {
    let course = state
        .course_service
        .create(CourseInput {
            title: req.title,
            sub_groups: req.sub_groups,
        })
        .await?;
    Ok(ApiResponse::ok(course))
}

async fn update(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateCourseRequest>,
) -> AppResult<ApiResponse<course::Model>> {
    let course = state
        .course_service
        .update(
            &req.id,
            CourseInput {
                title: req.title,
                sub_groups: req.sub_groups,
            },
        )
        .await?;
    Ok(ApiResponse::ok(course))
}

async fn delete(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CourseIdRequest>,
) -> AppResult<impl IntoResponse> {
    state.course_service.delete(&req.id).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(list))
        .route("/show", post(show))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
}
