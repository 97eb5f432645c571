//! Request extractors.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use coursedesk_common::AppError;
use coursedesk_core::{NavigationSession, SessionKey};
use coursedesk_db::entities::user;
use tokio::sync::Mutex;

use crate::middleware::AppState;

/// Header carrying the client id that separates tabs of one user.
pub const SESSION_HEADER: &str = "x-session-id";

const MAX_CLIENT_ID_LEN: usize = 128;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Authenticated admin extractor.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self(user))
    }
}

/// The authenticated user together with their navigation session.
///
/// The session is looked up by user id and the optional `X-Session-Id`
/// header, and created on first use.
pub struct CurrentSession {
    pub user: user::Model,
    pub session: Arc<Mutex<NavigationSession>>,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        let client_id = client_id(parts)?;

        let key = SessionKey::new(user.id.clone(), client_id);
        let session = state.sessions.get_or_create(&key).await;
        Ok(Self { user, session })
    }
}

fn client_id(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(value) = parts.headers.get(SESSION_HEADER) else {
        return Ok(None);
    };
    let id = value
        .to_str()
        .map_err(|_| AppError::BadRequest("Invalid session id".to_string()))?
        .trim();

    if id.is_empty() {
        return Ok(None);
    }
    if id.len() > MAX_CLIENT_ID_LEN {
        return Err(AppError::BadRequest("Session id is too long".to_string()));
    }
    Ok(Some(id.to_string()))
}
