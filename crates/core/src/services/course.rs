//! Course administration.

use chrono::Utc;
use coursedesk_common::{AppError, AppResult, IdGenerator};
use coursedesk_db::{entities::course, repositories::CourseRepository};
use rand::seq::SliceRandom;
use sea_orm::Set;
use validator::Validate;

/// Card backgrounds picked for new courses.
pub const THEMES: [&str; 5] = [
    "linear-gradient(135deg, #1e293b, #334155)",
    "linear-gradient(135deg, #1e40af, #3b82f6)",
    "linear-gradient(135deg, #0f766e, #10b981)",
    "linear-gradient(135deg, #b91c1c, #ef4444)",
    "linear-gradient(135deg, #7c3aed, #8b5cf6)",
];

/// Title and sub-groups of a course being created or edited.
#[derive(Debug, Clone, Validate)]
pub struct CourseInput {
    #[validate(length(min = 1, max = 256, message = "Title is required"))]
    pub title: String,
    pub sub_groups: Vec<String>,
}

/// Trim, upper-case and de-duplicate sub-group codes, dropping blanks.
#[must_use]
pub fn normalize_sub_groups(codes: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes {
        let code = code.trim().to_uppercase();
        if !code.is_empty() && !out.contains(&code) {
            out.push(code);
        }
    }
    out
}

#[derive(Clone)]
pub struct CourseService {
    course_repo: CourseRepository,
    id_gen: IdGenerator,
}

impl CourseService {
    #[must_use]
    pub const fn new(course_repo: CourseRepository) -> Self {
        Self {
            course_repo,
            id_gen: IdGenerator::new(),
        }
    }

    pub async fn list(&self) -> AppResult<Vec<course::Model>> {
        self.course_repo.find_all().await
    }

    pub async fn get(&self, id: &str) -> AppResult<course::Model> {
        self.course_repo.get_by_id(id).await
    }

    pub async fn create(&self, input: CourseInput) -> AppResult<course::Model> {
        let input = Self::clean(input)?;
        let theme = THEMES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(THEMES[0]);

        let model = course::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            sub_groups: Set(serde_json::json!(input.sub_groups)),
            theme: Set(theme.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let created = self.course_repo.create(model).await?;
        tracing::info!(id = %created.id, title = %created.title, "Created course");
        Ok(created)
    }

    /// Rename a course and replace its sub-groups. The theme is kept.
    pub async fn update(&self, id: &str, input: CourseInput) -> AppResult<course::Model> {
        let input = Self::clean(input)?;
        let existing = self.course_repo.get_by_id(id).await?;

        let mut model: course::ActiveModel = existing.into();
        model.title = Set(input.title);
        model.sub_groups = Set(serde_json::json!(input.sub_groups));

        let updated = self.course_repo.update(model).await?;
        tracing::info!(id = %updated.id, "Updated course");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.course_repo.get_by_id(id).await?;
        self.course_repo.delete(id).await?;
        tracing::info!(id = %id, "Deleted course");
        Ok(())
    }

    fn clean(input: CourseInput) -> AppResult<CourseInput> {
        let input = CourseInput {
            title: input.title.trim().to_string(),
            sub_groups: normalize_sub_groups(&input.sub_groups),
        };
        input.validate().map_err(AppError::from)?;
        Ok(input)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use coursedesk_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> CourseService {
        CourseService::new(CourseRepository::new(Arc::new(db)))
    }

    #[test]
    fn test_normalize_sub_groups() {
        let codes = ["10a ", "", "10A", "  ", "11b"].map(String::from);
        assert_eq!(normalize_sub_groups(&codes), ["10A", "11B"]);
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = svc
            .create(CourseInput {
                title: "   ".to_string(),
                sub_groups: Vec::new(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_course() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::course("c1", &["10A", "10B"])]])
            .into_connection();
        let svc = service(db);

        let created = svc
            .create(CourseInput {
                title: "Mathematics".to_string(),
                sub_groups: vec!["10a".to_string(), "10b".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(created.sub_group_codes(), ["10A", "10B"]);
        assert!(THEMES.contains(&created.theme.as_str()));
    }

    #[tokio::test]
    async fn test_update_missing_course() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<course::Model>::new()])
            .into_connection();
        let svc = service(db);

        let result = svc
            .update(
                "nope",
                CourseInput {
                    title: "Physics".to_string(),
                    sub_groups: Vec::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
