//! Identity lookups.

use coursedesk_common::{AppError, AppResult};
use coursedesk_db::{entities::user, repositories::UserRepository};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Resolve a bearer token to its user.
    ///
    /// Unknown tokens are `Unauthorized`; students awaiting approval are
    /// `Forbidden`.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_approved() {
            return Err(AppError::Forbidden(
                "Account is awaiting approval".to_string(),
            ));
        }
        Ok(user)
    }

    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use coursedesk_db::entities::user::UserStatus;
    use coursedesk_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(results: Vec<Vec<user::Model>>) -> UserService {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(results)
            .into_connection();
        UserService::new(UserRepository::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn test_authenticate_approved_user() {
        let svc = service(vec![vec![fixtures::admin("a1")]]);
        let user = svc.authenticate_by_token("token-a1").await.unwrap();
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let svc = service(vec![Vec::new()]);
        let result = svc.authenticate_by_token("bogus").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_pending_student_is_forbidden() {
        let svc = service(vec![vec![fixtures::student(
            "s1",
            UserStatus::Pending,
            None,
        )]]);
        let result = svc.authenticate_by_token("token-s1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
