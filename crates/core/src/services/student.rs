//! Student approvals and roster.

use coursedesk_common::{AppError, AppResult};
use coursedesk_db::{
    entities::user::{self, UserStatus},
    repositories::UserRepository,
};

#[derive(Clone)]
pub struct StudentService {
    user_repo: UserRepository,
}

impl StudentService {
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Students waiting for approval.
    pub async fn list_pending(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_pending_students().await
    }

    /// Approve a pending student.
    pub async fn approve(&self, user_id: &str) -> AppResult<user::Model> {
        let student = self.get_student(user_id).await?;
        if student.is_approved() {
            return Ok(student);
        }

        let approved = self
            .user_repo
            .set_status(user_id, UserStatus::Approved)
            .await?;
        tracing::info!(user_id = %user_id, "Approved student");
        Ok(approved)
    }

    /// Approved students enrolled in a course.
    pub async fn list_course_students(&self, course_id: &str) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_students_by_course(course_id).await
    }

    /// Remove a student account.
    pub async fn delete_student(&self, user_id: &str) -> AppResult<()> {
        self.get_student(user_id).await?;
        self.user_repo.delete(user_id).await?;
        tracing::info!(user_id = %user_id, "Deleted student");
        Ok(())
    }

    async fn get_student(&self, user_id: &str) -> AppResult<user::Model> {
        let user = self.user_repo.get_by_id(user_id).await?;
        if user.is_admin() {
            return Err(AppError::Forbidden(
                "Admin accounts are not managed here".to_string(),
            ));
        }
        Ok(user)
    }
}
