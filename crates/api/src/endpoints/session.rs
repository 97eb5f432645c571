//! Session endpoints: who am I, and which course am I browsing.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::post,
};
use coursedesk_common::{AppError, AppResult};
use coursedesk_core::CourseContext;
use coursedesk_db::entities::user;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, CurrentSession},
    middleware::AppState,
    response::{ApiResponse, FormatParams, SessionView},
};

/// Enter course request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterCourseRequest {
    pub course_id: Option<String>,
    pub sub_group: Option<String>,
}

/// Start browsing a course.
///
/// Students are always placed in their own course and sub-group. Admins
/// pick a course and may preview it as one of its sub-groups.
async fn enter_course(
    current: CurrentSession,
    State(state): State<AppState>,
    Query(format): Query<FormatParams>,
    Json(req): Json<EnterCourseRequest>,
) -> AppResult<SessionView> {
    let context = if current.user.is_admin() {
        admin_context(&state, req).await?
    } else {
        student_context(&current.user, &req)?
    };

    let mut session = current.session.lock().await;
    session.enter_course(context);
    tracing::debug!(user_id = %current.user.id, course = ?session.course(), "Entered course");

    Ok(SessionView::render(&session, &format, current.user.is_admin()))
}

async fn admin_context(state: &AppState, req: EnterCourseRequest) -> AppResult<CourseContext> {
    let course_id = req
        .course_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("courseId is required".to_string()))?;
    let course = state.course_service.get(&course_id).await?;

    let sub_group = req
        .sub_group
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty());
    if let Some(code) = &sub_group
        && !course.has_sub_group(code)
    {
        return Err(AppError::Validation(format!(
            "Course {} has no sub-group {code}",
            course.id
        )));
    }

    Ok(CourseContext {
        course_id: course.id,
        sub_group,
    })
}

fn student_context(user: &user::Model, req: &EnterCourseRequest) -> AppResult<CourseContext> {
    let course_id = user
        .course_id
        .clone()
        .ok_or_else(|| AppError::Forbidden("You are not enrolled in a course".to_string()))?;

    if let Some(requested) = req.course_id.as_deref()
        && requested != course_id
    {
        return Err(AppError::Forbidden(
            "Students can only open their own course".to_string(),
        ));
    }

    Ok(CourseContext {
        course_id,
        sub_group: user.sub_group_code.clone(),
    })
}

/// Current state of the caller's session.
async fn show_session(
    current: CurrentSession,
    Query(format): Query<FormatParams>,
) -> AppResult<SessionView> {
    let session = current.session.lock().await;
    Ok(SessionView::render(&session, &format, current.user.is_admin()))
}

/// The signed-in user.
async fn me(AuthUser(user): AuthUser) -> AppResult<ApiResponse<user::Model>> {
    Ok(ApiResponse::ok(user))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session/course", post(enter_course))
        .route("/session", post(show_session))
        .route("/me", post(me))
}
