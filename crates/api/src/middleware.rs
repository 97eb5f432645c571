//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use coursedesk_common::{AppError, StorageBackend};
use coursedesk_core::{
    AttachmentUploader, ContentService, ContentTreeService, CourseService, Navigator,
    ReorderService, SessionStore, StudentService, UserService,
};
use coursedesk_db::repositories::{ContentItemRepository, CourseRepository, UserRepository};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub course_service: CourseService,
    pub student_service: StudentService,
    pub content_service: ContentService,
    pub content_tree: ContentTreeService,
    pub navigator: Navigator,
    pub reorder_service: ReorderService,
    pub sessions: SessionStore,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        sessions: SessionStore,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let course_repo = CourseRepository::new(Arc::clone(&db));
        let item_repo = ContentItemRepository::new(db);

        let content_tree = ContentTreeService::new(item_repo.clone());

        Self {
            user_service: UserService::new(user_repo.clone()),
            course_service: CourseService::new(course_repo),
            student_service: StudentService::new(user_repo),
            content_service: ContentService::new(
                item_repo.clone(),
                AttachmentUploader::new(storage),
            ),
            navigator: Navigator::new(content_tree.clone()),
            reorder_service: ReorderService::new(item_repo, content_tree.clone()),
            content_tree,
            sessions,
        }
    }
}

/// Authentication middleware.
///
/// A valid bearer token puts the `user::Model` into the request extensions.
/// Accounts awaiting approval are turned away here; other failures leave the
/// request anonymous so public routes still answer.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(err @ AppError::Forbidden(_)) => return err.into_response(),
            Err(err) if err.is_server_error() => return err.into_response(),
            Err(err) => {
                tracing::debug!(error = %err, "Bearer token rejected");
            }
        }
    }

    next.run(req).await
}
