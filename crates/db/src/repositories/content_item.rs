//! Content item repository.

use std::sync::Arc;

use crate::entities::{ContentItem, content_item};
use chrono::Utc;
use coursedesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, TransactionTrait, sea_query::Expr,
};

/// Content item repository for database operations.
#[derive(Clone)]
pub struct ContentItemRepository {
    db: Arc<DatabaseConnection>,
}

impl ContentItemRepository {
    /// Create a new content item repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an item by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<content_item::Model>> {
        ContentItem::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an item by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<content_item::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ContentNotFound(id.to_string()))
    }

    /// Load every item of a course.
    ///
    /// Listing filters sub-group, section and parent in memory, so this is
    /// the only read the dashboard needs per navigation step.
    pub async fn find_by_course(&self, course_id: &str) -> AppResult<Vec<content_item::Model>> {
        ContentItem::find()
            .filter(content_item::Column::CourseId.eq(course_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the direct children of a folder.
    pub async fn count_children(&self, parent_id: &str) -> AppResult<u64> {
        ContentItem::find()
            .filter(content_item::Column::ParentId.eq(parent_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new item.
    pub async fn create(&self, model: content_item::ActiveModel) -> AppResult<content_item::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an item.
    pub async fn update(&self, model: content_item::ActiveModel) -> AppResult<content_item::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an item.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let item = self.find_by_id(id).await?;
        if let Some(i) = item {
            i.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Write a new `order` for each `(id, order)` pair.
    ///
    /// All updates commit together or not at all. Any failure, including an
    /// id that no longer exists, surfaces as [`AppError::Write`].
    pub async fn bulk_update_order(&self, orders: &[(String, i32)]) -> AppResult<()> {
        if orders.is_empty() {
            return Ok(());
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Write(e.to_string()))?;

        let now = Utc::now();
        for (id, order) in orders {
            let result = ContentItem::update_many()
                .col_expr(content_item::Column::Order, Expr::value(*order))
                .col_expr(content_item::Column::UpdatedAt, Expr::value(now))
                .filter(content_item::Column::Id.eq(id.as_str()))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Write(e.to_string()))?;

            // Dropping the transaction rolls back the earlier updates
            if result.rows_affected != 1 {
                return Err(AppError::Write(format!("Content item {id} no longer exists")));
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Write(e.to_string()))
    }
}
