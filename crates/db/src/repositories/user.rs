//! User repository.

use std::sync::Arc;

use crate::entities::{
    User,
    user::{self, UserRole, UserStatus},
};
use coursedesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {id}")))
    }

    /// Find a user by token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Students waiting for approval, oldest first.
    pub async fn find_pending_students(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::Role.eq(UserRole::Student))
            .filter(user::Column::Status.eq(UserStatus::Pending))
            .order_by_asc(user::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approved students enrolled in a course, by name.
    pub async fn find_students_by_course(&self, course_id: &str) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::Role.eq(UserRole::Student))
            .filter(user::Column::Status.eq(UserStatus::Approved))
            .filter(user::Column::CourseId.eq(course_id))
            .order_by_asc(user::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set a user's registration status.
    pub async fn set_status(&self, id: &str, status: UserStatus) -> AppResult<user::Model> {
        let user = self.get_by_id(id).await?;
        let mut active: user::ActiveModel = user.into();
        active.status = Set(status);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a user.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let user = self.find_by_id(id).await?;
        if let Some(u) = user {
            u.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }
}
